//! Block invoke function names.

/// `__<outer>_block_invoke`, with `_<ordinal + 1>` appended for the second
/// and later blocks of the same outer context.
///
/// `outer` is the enclosing function's link name, or the length-prefixed
/// method name for Objective-C methods.
#[must_use]
pub fn block_invoke_name(outer: &str, ordinal: u32) -> String {
    let mut name = format!("__{outer}_block_invoke");
    if ordinal > 0 {
        name.push('_');
        name.push_str(&(ordinal + 1).to_string());
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_block_has_no_suffix() {
        assert_eq!(block_invoke_name("run", 0), "__run_block_invoke");
        assert_eq!(block_invoke_name("_Z3foov", 0), "___Z3foov_block_invoke");
    }

    #[test]
    fn later_blocks_are_numbered_from_two() {
        assert_eq!(block_invoke_name("run", 1), "__run_block_invoke_2");
        assert_eq!(block_invoke_name("run", 9), "__run_block_invoke_10");
    }
}
