use axum::{Form, Json};
use serde::{Deserialize, Serialize};

use crate::services::chatbot_service;

#[derive(Debug, Default, Deserialize)]
pub struct ChatbotForm {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize)]
pub struct ChatbotReply {
    pub reply: String,
}

pub async fn chatbot_handler(Form(form): Form<ChatbotForm>) -> Json<ChatbotReply> {
    Json(ChatbotReply {
        reply: chatbot_service::reply(&form.q),
    })
}
