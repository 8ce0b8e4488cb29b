//! Keyword FAQ bot for the public help widget. First matching topic wins.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Topic {
    Activities,
    SignUp,
    Hours,
}

const TOPICS: &[(Topic, &[&str])] = &[
    (
        Topic::Activities,
        &["มีกิจกรรม", "กิจกรรมอะไร", "what activities", "which activities", "list activities"],
    ),
    (
        Topic::SignUp,
        &["สมัครอย่างไร", "สมัคร", "sign up", "signup", "register", "join"],
    ),
    (Topic::Hours, &["ได้กี่ชั่วโมง", "ชั่วโมง", "hour"]),
];

fn match_topic(question: &str) -> Option<Topic> {
    let q = question.trim().to_lowercase();
    if q.is_empty() {
        return None;
    }
    TOPICS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| q.contains(k)))
        .map(|(topic, _)| *topic)
}

fn is_thai(text: &str) -> bool {
    text.chars().any(|c| ('\u{0E00}'..='\u{0E7F}').contains(&c))
}

pub fn reply(question: &str) -> String {
    let thai = is_thai(question);
    let text = match (match_topic(question), thai) {
        (Some(Topic::Activities), true) => {
            "ตอนนี้มีกิจกรรมที่ลงไว้บนหน้า 'กิจกรรมทั้งหมด' คุณสามารถใช้ตัวกรองหรือค้นหาเพื่อดูรายละเอียดได้"
        }
        (Some(Topic::Activities), false) => {
            "All open activities are on the Activities page. Use the search box and filters to narrow them down."
        }
        (Some(Topic::SignUp), true) => {
            "เข้าสู่หน้ากิจกรรม เลือกกิจกรรมที่ต้องการ แล้วกดปุ่ม 'สมัคร' กรอกข้อมูลเพิ่มเติมแล้วส่งได้เลย"
        }
        (Some(Topic::SignUp), false) => {
            "Open an activity, press \"Sign up\" and add an optional note. If it is full you join the waitlist."
        }
        (Some(Topic::Hours), true) => {
            "ชั่วโมงที่ได้รับจะแสดงในรายละเอียดกิจกรรม และจะยืนยันเมื่อสแกน QR หน้างานครั้งเดียวต่อผู้ใช้"
        }
        (Some(Topic::Hours), false) => {
            "Each activity lists its hours. They are credited once per person when you scan the QR code on site."
        }
        (None, true) => {
            "ขอโทษ ฉันยังไม่เข้าใจคำถามนี้ ตัวอย่างคำถามที่รองรับ: 'มีกิจกรรมอะไรบ้าง?', 'สมัครอย่างไร?', 'ได้กี่ชั่วโมง?'"
        }
        (None, false) => {
            "Sorry, I did not understand. Try: \"What activities are there?\", \"How do I sign up?\" or \"How many hours do I get?\""
        }
    };
    text.to_string()
}
