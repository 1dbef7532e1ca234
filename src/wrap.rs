use crate::mappers::MapError;
use crate::record::FieldMap;

/// Split free text into numbered `{field}#{i}` line slots for a template.
///
/// Accumulation counts bare word lengths only; a closed line keeps its words
/// concatenated without separators. Output carries exactly `max_lines` keys,
/// trailing unused slots set to `""`.
pub fn split_to_fields(
    text: &str,
    field_name: &str,
    chars_per_line: usize,
    max_lines: usize,
) -> Result<FieldMap, MapError> {
    let mut segments: Vec<String> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        if current_len + word.len() < chars_per_line {
            current_len += word.len();
            current.push(word);
        } else {
            segments.push(current.concat());
            current_len = word.len();
            current = vec![word];
        }
    }
    segments.push(current.concat());

    let populated: Vec<&String> = segments.iter().filter(|s| !s.is_empty()).collect();
    if populated.len() > max_lines {
        return Err(MapError::CapacityExceeded {
            field: field_name.to_string(),
            available: max_lines,
            required: populated.len(),
        });
    }

    let mut fields = FieldMap::new();
    for i in 1..=max_lines {
        fields.insert(format!("{}#{}", field_name, i), String::new());
    }
    for (i, segment) in populated.iter().enumerate() {
        fields.insert(format!("{}#{}", field_name, i + 1), (*segment).clone());
    }
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn output_is_total_over_all_line_slots() {
        let fields = split_to_fields("gain one ore", "Rules text", 24, 7).unwrap();
        assert_eq!(fields.len(), 7);
        assert_eq!(fields["Rules text#1"], "gainoneore");
        for i in 2..=7 {
            assert_eq!(fields[&format!("Rules text#{}", i)], "");
        }
    }

    #[test]
    fn words_survive_in_order_across_lines() {
        let text = "alpha beta gamma delta epsilon zeta eta theta";
        let fields = split_to_fields(text, "body", 12, 7).unwrap();
        let mut joined = String::new();
        for i in 1..=7 {
            joined.push_str(&fields[&format!("body#{}", i)]);
        }
        let expected: String = text.split_whitespace().collect();
        assert_eq!(joined, expected);
    }

    #[test]
    fn too_many_lines_is_a_capacity_error() {
        let err = split_to_fields(
            "one two three four five six seven eight nine ten",
            "Rules text",
            24,
            1,
        )
        .unwrap_err();
        match err {
            MapError::CapacityExceeded {
                available,
                required,
                ..
            } => {
                assert_eq!(available, 1);
                assert_eq!(required, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_input_fills_defaults_without_error() {
        let fields = split_to_fields("", "note", 10, 3).unwrap();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields["note#1"], "");
        assert_eq!(fields["note#2"], "");
        assert_eq!(fields["note#3"], "");
    }

    #[test]
    fn overlong_word_occupies_its_own_line() {
        let fields = split_to_fields("incomprehensibilities ok", "body", 10, 3).unwrap();
        assert_eq!(fields["body#1"], "incomprehensibilities");
        assert_eq!(fields["body#2"], "ok");
        assert_eq!(fields["body#3"], "");
    }
}
