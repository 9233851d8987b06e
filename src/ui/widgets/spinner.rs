/// Frames cycled while a remote request is in flight.
pub const FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Return the frame for a spinner index, wrapping out-of-range indexes.
///
pub fn frame(index: usize) -> &'static str {
    FRAMES[index % FRAMES.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_wraps() {
        assert_eq!(frame(0), FRAMES[0]);
        assert_eq!(frame(FRAMES.len() + 1), FRAMES[1]);
    }
}
