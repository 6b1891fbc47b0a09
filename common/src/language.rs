//! 対応言語カタログ
//!
//! 同じ基本言語でも方言ごとに別エントリ（コードで区別）

use crate::error::{Error, Result};

/// 未解決の言語コードに使う旗
pub const FALLBACK_FLAG: &str = "🌍";

/// 対象言語
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageTarget {
    pub code: &'static str,
    pub display_name: &'static str,
    pub native_display_name: &'static str,
    pub flag: &'static str,
}

impl LanguageTarget {
    /// 右から左へ書く言語か（アラビア語系）
    pub fn is_right_to_left(&self) -> bool {
        self.code.starts_with("ar")
    }
}

/// 対応言語（先頭がデフォルト）
pub const SUPPORTED_LANGUAGES: &[LanguageTarget] = &[
    LanguageTarget {
        code: "en",
        display_name: "English",
        native_display_name: "English",
        flag: "🇺🇸",
    },
    LanguageTarget {
        code: "ar",
        display_name: "Arabic",
        native_display_name: "العربية (بالمصري)",
        flag: "🇪🇬",
    },
    LanguageTarget {
        code: "ar-fusha",
        display_name: "Arabic (Eloquent)",
        native_display_name: "العربية",
        flag: "🇸🇦",
    },
    LanguageTarget {
        code: "ar-sy",
        display_name: "Arabic (Syrian)",
        native_display_name: "العامية السورية",
        flag: "🇸🇾",
    },
    LanguageTarget {
        code: "fr",
        display_name: "French",
        native_display_name: "Français",
        flag: "🇫🇷",
    },
    LanguageTarget {
        code: "es",
        display_name: "Spanish",
        native_display_name: "Español",
        flag: "🇪🇸",
    },
    LanguageTarget {
        code: "de",
        display_name: "German",
        native_display_name: "Deutsch",
        flag: "🇩🇪",
    },
];

/// デフォルト言語（English）
pub fn default_language() -> &'static LanguageTarget {
    &SUPPORTED_LANGUAGES[0]
}

/// コードから言語を検索
pub fn find_language(code: &str) -> Option<&'static LanguageTarget> {
    SUPPORTED_LANGUAGES.iter().find(|l| l.code == code)
}

/// コードから言語を検索（見つからなければエラー）
pub fn require_language(code: &str) -> Result<&'static LanguageTarget> {
    find_language(code).ok_or_else(|| Error::UnknownLanguage(code.to_string()))
}

/// 言語コードに対応する旗（未解決ならフォールバック）
pub fn flag_for(code: &str) -> &'static str {
    find_language(code).map(|l| l.flag).unwrap_or(FALLBACK_FLAG)
}
