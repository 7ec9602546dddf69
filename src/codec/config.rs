//! Codec configuration.

/// Default maximum nesting depth of sub-messages.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Default maximum size of an input buffer accepted by the decoder (1 MB).
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Limits and policies applied by [`MessageCodec`](super::MessageCodec).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecConfig {
    /// Deepest allowed chain of nested messages (top level is depth 0).
    pub max_depth: usize,
    /// Largest top-level buffer the decoder accepts.
    pub max_message_size: usize,
    /// Accept packed encoding for repeated varint fields on decode.
    pub accept_packed: bool,
}

impl CodecConfig {
    /// Create a config with default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum nesting depth.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set the maximum decoded message size.
    pub fn max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Enable or disable packed repeated decoding.
    pub fn accept_packed(mut self, accept: bool) -> Self {
        self.accept_packed = accept;
        self
    }
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            accept_packed: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CodecConfig::default();
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(config.max_message_size, DEFAULT_MAX_MESSAGE_SIZE);
        assert!(config.accept_packed);
        assert_eq!(CodecConfig::new(), config);
    }

    #[test]
    fn test_builder_setters() {
        let config = CodecConfig::new()
            .max_depth(4)
            .max_message_size(128)
            .accept_packed(false);
        assert_eq!(config.max_depth, 4);
        assert_eq!(config.max_message_size, 128);
        assert!(!config.accept_packed);
    }
}
