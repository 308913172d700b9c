//! Localized user-facing text
//!
//! Lookup is an exhaustive match over (key, language), so adding a key or a
//! language without its translations does not compile.

use serde::{Deserialize, Serialize};

use crate::language::Language;

/// Keys for every fixed user-facing string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKey {
    Welcome,
    WelcomeInstructions,
    DidntUnderstand,
    ProcessingFailed,
    RecognitionUnsupported,
    NoMicrophone,
    PermissionDenied,
    /// Contains a `{language}` placeholder
    LanguageNotSupported,
    RecognitionFailed,
    RecognitionStartFailed,
    SynthesisFailed,
}

impl MessageKey {
    pub const ALL: [MessageKey; 11] = [
        Self::Welcome,
        Self::WelcomeInstructions,
        Self::DidntUnderstand,
        Self::ProcessingFailed,
        Self::RecognitionUnsupported,
        Self::NoMicrophone,
        Self::PermissionDenied,
        Self::LanguageNotSupported,
        Self::RecognitionFailed,
        Self::RecognitionStartFailed,
        Self::SynthesisFailed,
    ];
}

/// Look up the text for `key` in `lang`
pub fn localize(key: MessageKey, lang: Language) -> &'static str {
    use Language::{English as En, Hindi as Hi};
    use MessageKey::*;

    match (key, lang) {
        (Welcome, En) => "Welcome to Coffee Bot",
        (Welcome, Hi) => "कॉफ़ी बॉट में आपका स्वागत है",

        (WelcomeInstructions, En) => {
            "Press the microphone button and start speaking. I'll listen and respond to what you say."
        },
        (WelcomeInstructions, Hi) => {
            "माइक्रोफ़ोन बटन दबाएँ और बोलना शुरू करें। मैं सुनूंगा और आपकी बात का जवाब दूंगा।"
        },

        (DidntUnderstand, En) => "I didn't understand, can you please rephrase?",
        (DidntUnderstand, Hi) => "मुझे समझ में नहीं आया, क्या आप कृपया फिर से कह सकते हैं?",

        (ProcessingFailed, En) => "Sorry, I encountered an error while processing your request.",
        (ProcessingFailed, Hi) => "क्षमा करें, आपके अनुरोध को संसाधित करने में एक त्रुटि हुई।",

        (RecognitionUnsupported, En) => "Speech recognition is not supported in this environment.",
        (RecognitionUnsupported, Hi) => "इस वातावरण में वाक् पहचान समर्थित नहीं है।",

        (NoMicrophone, En) => {
            "No microphone was detected. Please ensure your microphone is connected."
        },
        (NoMicrophone, Hi) => {
            "कोई माइक्रोफ़ोन नहीं मिला। कृपया सुनिश्चित करें कि आपका माइक्रोफ़ोन जुड़ा हुआ है।"
        },

        (PermissionDenied, En) => {
            "Microphone permission was denied. Please allow microphone access to use this feature."
        },
        (PermissionDenied, Hi) => {
            "माइक्रोफ़ोन की अनुमति नहीं दी गई। इस सुविधा के लिए कृपया माइक्रोफ़ोन की अनुमति दें।"
        },

        (LanguageNotSupported, En) => {
            "Speech recognition is not available for {language} on this device."
        },
        (LanguageNotSupported, Hi) => "इस डिवाइस पर {language} के लिए वाक् पहचान उपलब्ध नहीं है।",

        (RecognitionFailed, En) => "An error occurred with speech recognition.",
        (RecognitionFailed, Hi) => "वाक् पहचान में एक त्रुटि हुई।",

        (RecognitionStartFailed, En) => {
            "Failed to start speech recognition. Please restart the conversation."
        },
        (RecognitionStartFailed, Hi) => {
            "वाक् पहचान शुरू नहीं हो सकी। कृपया बातचीत फिर से शुरू करें।"
        },

        (SynthesisFailed, En) => "Error occurred while speaking. Please try again.",
        (SynthesisFailed, Hi) => "बोलते समय एक त्रुटि हुई। कृपया पुनः प्रयास करें।",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_key_translated() {
        for key in MessageKey::ALL {
            for lang in Language::all() {
                assert!(!localize(key, *lang).is_empty(), "{key:?} missing for {lang}");
            }
        }
    }

    #[test]
    fn test_translations_differ_per_language() {
        for key in MessageKey::ALL {
            assert_ne!(
                localize(key, Language::English),
                localize(key, Language::Hindi),
                "{key:?} not translated"
            );
        }
    }

    #[test]
    fn test_language_placeholder_present() {
        for lang in Language::all() {
            assert!(localize(MessageKey::LanguageNotSupported, *lang).contains("{language}"));
        }
    }
}
