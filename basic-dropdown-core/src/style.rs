//! Inline style for the content element

/// Position computed for the content by the reposition step. Values are CSS
/// lengths such as `"12px"`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContentPosition {
    pub top: Option<String>,
    pub left: Option<String>,
    pub right: Option<String>,
    pub width: Option<String>,
    pub height: Option<String>,
    /// Extra declarations, rendered after the positional ones in order
    pub other_styles: Vec<(String, String)>,
}

/// Render `position` as an inline `style` attribute value.
pub fn content_style(position: &ContentPosition) -> String {
    let positional = [
        ("top", &position.top),
        ("left", &position.left),
        ("right", &position.right),
        ("width", &position.width),
        ("height", &position.height),
    ];

    let mut declarations: Vec<String> = positional
        .iter()
        .filter_map(|(property, value)| {
            value
                .as_deref()
                .map(|value| format!("{property}: {value};"))
        })
        .collect();
    declarations.extend(
        position
            .other_styles
            .iter()
            .map(|(property, value)| format!("{property}: {value};")),
    );
    declarations.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_position() {
        assert_eq!(content_style(&ContentPosition::default()), "");
    }

    #[test]
    fn test_skips_missing_values() {
        let position = ContentPosition {
            top: Some("10px".into()),
            right: Some("4px".into()),
            ..Default::default()
        };
        assert_eq!(content_style(&position), "top: 10px; right: 4px;");
    }

    #[test]
    fn test_other_styles_follow_positional() {
        let position = ContentPosition {
            left: Some("0px".into()),
            width: Some("200px".into()),
            other_styles: vec![
                ("max-height".into(), "300px".into()),
                ("z-index".into(), "10".into()),
            ],
            ..Default::default()
        };
        assert_eq!(
            content_style(&position),
            "left: 0px; width: 200px; max-height: 300px; z-index: 10;"
        );
    }
}
