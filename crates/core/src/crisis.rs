//! Self-harm phrase detection and the fixed safety response.
//!
//! Matching is a plain case-insensitive substring test against a fixed list
//! of English and transliterated Hindi phrases. A hit means the message is
//! answered with [`SAFETY_MESSAGE`] and never leaves the server.

use serde::Serialize;

/// Phrases that trigger the crisis response.
pub const CRISIS_KEYWORDS: [&str; 18] = [
    "kill myself",
    "end my life",
    "suicide",
    "hurt myself",
    "self harm",
    "want to die",
    "not worth living",
    "better off dead",
    "take my life",
    "end it all",
    "can't go on",
    "mar jaana",
    "jeevan khatam",
    "aatmahatya",
    "khud ko nuksaan",
    "marna",
    "jeene layak nahi",
    "bekar hun",
];

/// Reply sent instead of a generated answer when [`is_crisis`] matches.
pub const SAFETY_MESSAGE: &str = "🚨 I’m concerned about your safety. Please contact immediately:\n\
National Emergency: 112\n\
Mental Health Helpline: 14416\n\
KIRAN Support: 1800-5990019\n\
Would you like help to connect with a counselor?";

/// A phone line offered on the crisis resources page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EmergencyContact {
    pub name: &'static str,
    pub number: &'static str,
    pub description: &'static str,
}

pub const EMERGENCY_CONTACTS: [EmergencyContact; 6] = [
    EmergencyContact {
        name: "National Emergency",
        number: "112",
        description: "Police, fire and ambulance",
    },
    EmergencyContact {
        name: "Tele-MANAS",
        number: "14416",
        description: "National tele mental health helpline, 24/7",
    },
    EmergencyContact {
        name: "KIRAN Mental Health Helpline",
        number: "1800-5990019",
        description: "Toll-free rehabilitation helpline, 24/7",
    },
    EmergencyContact {
        name: "Vandrevala Foundation",
        number: "9999666555",
        description: "Free counselling by phone or WhatsApp",
    },
    EmergencyContact {
        name: "J&K Police Control Room",
        number: "0191-2561578",
        description: "Jammu police emergency line",
    },
    EmergencyContact {
        name: "GMC Hospital Jammu",
        number: "0191-2584290",
        description: "Government Medical College emergency ward",
    },
];

/// Returns `true` if `text` contains any crisis phrase, ignoring case.
#[must_use]
pub fn is_crisis(text: &str) -> bool {
    let text = text.to_lowercase();
    CRISIS_KEYWORDS.iter().any(|phrase| text.contains(phrase))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_phrase_in_any_case() {
        assert!(is_crisis("kill myself"));
        assert!(is_crisis("Sometimes I want to KILL MYSELF."));
        assert!(is_crisis("I think everyone is Better Off Dead without me"));
    }

    #[test]
    fn test_detects_transliterated_phrases() {
        assert!(is_crisis("mujhe lagta hai main bekar hun"));
        assert!(is_crisis("Aatmahatya ke khayal aate hain"));
    }

    #[test]
    fn test_ordinary_messages_pass() {
        assert!(!is_crisis("I feel a bit tired"));
        assert!(!is_crisis("exams are stressing me out"));
        assert!(!is_crisis(""));
    }

    #[test]
    fn test_safety_message_lists_helplines() {
        for number in ["112", "14416", "1800-5990019"] {
            assert!(SAFETY_MESSAGE.contains(number));
        }
    }
}
