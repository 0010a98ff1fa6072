/// Text before the first `delimiter`, or the whole label if there is none.
///
/// The backend tags labels as `name_variant`; only `name` is displayed.
pub fn trim_label(label: &str, delimiter: char) -> &str {
    match label.split_once(delimiter) {
        Some((name, _)) => name,
        None => label,
    }
}

pub fn trim_labels(labels: &[String], delimiter: char) -> Vec<String> {
    labels
        .iter()
        .map(|label| trim_label(label, delimiter).to_string())
        .collect()
}
