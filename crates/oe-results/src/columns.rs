//! Column naming for tabular result output.

/// Expand variable names into one column name per state component.
///
/// With one name per component the names are used as they are. A single name
/// for a vector state is suffixed `name_1..name_n`. Anything else falls back
/// to `y_1..y_n`.
pub fn column_names(variable_names: &[String], dim: usize) -> Vec<String> {
    match variable_names {
        names if names.len() == dim => names.to_vec(),
        [name] => (1..=dim).map(|i| format!("{name}_{i}")).collect(),
        _ => (1..=dim).map(|i| format!("y_{i}")).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn one_name_per_component() {
        assert_eq!(column_names(&names(&["x", "v"]), 2), names(&["x", "v"]));
    }

    #[test]
    fn single_name_is_expanded() {
        assert_eq!(
            column_names(&names(&["q"]), 3),
            names(&["q_1", "q_2", "q_3"])
        );
    }

    #[test]
    fn mismatch_falls_back_to_generic_names() {
        assert_eq!(column_names(&names(&["a", "b"]), 3), names(&["y_1", "y_2", "y_3"]));
        assert_eq!(column_names(&[], 2), names(&["y_1", "y_2"]));
    }
}
