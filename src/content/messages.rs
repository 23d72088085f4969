//! Inline fallback text shown when no summary can be rendered

use crate::error::ContentError;

struct Messages {
    failed: &'static str,
    unavailable: &'static str,
}

const ZH: Messages = Messages {
    failed: "摘要加载失败，请稍后再试。",
    unavailable: "暂无文章摘要。",
};

const EN: Messages = Messages {
    failed: "The summary could not be loaded. Please try again later.",
    unavailable: "No summary is available for this article.",
};

fn table(locale: &str) -> &'static Messages {
    let lang = locale.trim().split(['-', '_']).next().unwrap_or_default();
    if lang.eq_ignore_ascii_case("en") {
        &EN
    } else {
        &ZH
    }
}

pub fn fallback_message(locale: &str, error: &ContentError) -> &'static str {
    let messages = table(locale);
    match error {
        ContentError::NoSource | ContentError::Empty => messages.unavailable,
        _ => messages.failed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;

    #[test]
    fn test_locale_selection() {
        let err = ContentError::Transport(TransportError::Status(500));
        assert_eq!(fallback_message("en-US", &err), EN.failed);
        assert_eq!(fallback_message("EN", &err), EN.failed);
        assert_eq!(fallback_message("zh-CN", &err), ZH.failed);
        assert_eq!(fallback_message("fr", &err), ZH.failed);
    }

    #[test]
    fn test_unavailable_wording() {
        assert_eq!(fallback_message("en", &ContentError::NoSource), EN.unavailable);
        assert_eq!(fallback_message("zh", &ContentError::Empty), ZH.unavailable);
    }
}
