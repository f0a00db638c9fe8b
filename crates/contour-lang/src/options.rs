/// Settings shared by dynamic evaluation and shader compilation.
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    /// Deepest call nesting allowed before `RecursionLimit`.
    pub max_depth: usize,
    /// Name of the point parameter in compiled shader code.
    pub input_name: String,
}

impl Default for Options {
    fn default() -> Self {
        Self { max_depth: 256, input_name: "P".to_string() }
    }
}

impl Options {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_input_name(mut self, name: impl Into<String>) -> Self {
        self.input_name = name.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_override_defaults() {
        let o = Options::default().with_max_depth(8).with_input_name("uv");
        assert_eq!(o.max_depth, 8);
        assert_eq!(o.input_name, "uv");
        assert_eq!(Options::default().input_name, "P");
    }
}
