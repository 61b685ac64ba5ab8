/// 病历段落标签, 按文档中出现的先后顺序排列
pub const HISTORY: &str = "History";
pub const CLINICAL_EXAMINATION: &str = "Clinical Examination";
pub const TREATMENT: &str = "Treatment";
pub const COMMENTS: &str = "Comments";

pub static SECTION_ORDER: [&str; 4] = [HISTORY, CLINICAL_EXAMINATION, TREATMENT, COMMENTS];

/// 提取 `label:` 与其后最近的下一个标签之间的文本
///
/// 标签缺失返回空字符串 (旧格式中段落缺失是常态)。下一个标签只在起始位置之后查找,
/// 出现在前文中的同名标签不影响结果; 没有后续标签时截取到文本末尾。
pub fn extract_section(text: &str, label: &str, next_labels: &[&str]) -> String {
    let marker = format!("{}:", label);
    let Some(pos) = text.find(&marker) else {
        return String::new();
    };
    let start = pos + marker.len();
    let rest = &text[start..];

    let end = next_labels
        .iter()
        .filter_map(|next| rest.find(&format!("{}:", next)))
        .min()
        .unwrap_or(rest.len());

    rest[..end].trim().to_string()
}

/// 某标签之后可能出现的标签
pub fn labels_after(label: &str) -> &'static [&'static str] {
    match SECTION_ORDER.iter().position(|l| *l == label) {
        Some(idx) => &SECTION_ORDER[idx + 1..],
        None => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "History: Limping. Clinical Examination: Normal gait. Treatment: Laser.";

    #[test]
    fn history_stops_at_nearest_next_label() {
        let history = extract_section(SAMPLE, HISTORY, &[CLINICAL_EXAMINATION, TREATMENT]);
        assert_eq!(history, "Limping.");
    }

    #[test]
    fn last_section_runs_to_end() {
        assert_eq!(extract_section(SAMPLE, TREATMENT, &[COMMENTS]), "Laser.");
    }

    #[test]
    fn missing_label_is_empty() {
        assert_eq!(extract_section(SAMPLE, COMMENTS, &[]), "");
    }

    #[test]
    fn next_label_before_start_is_ignored() {
        let text = "Treatment: pending. History: Vomiting overnight. Comments: recheck";
        assert_eq!(extract_section(text, HISTORY, &[TREATMENT, COMMENTS]), "Vomiting overnight.");
    }

    #[test]
    fn multiline_section() {
        let text = "History:\nAte a sock.\nNo vomiting.\nClinical Examination: Bright";
        assert_eq!(
            extract_section(text, HISTORY, labels_after(HISTORY)),
            "Ate a sock.\nNo vomiting."
        );
    }

    #[test]
    fn labels_after_follows_document_order() {
        assert_eq!(labels_after(HISTORY), &[CLINICAL_EXAMINATION, TREATMENT, COMMENTS]);
        assert_eq!(labels_after(TREATMENT), &[COMMENTS]);
        assert!(labels_after(COMMENTS).is_empty());
    }
}
