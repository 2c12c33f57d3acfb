// Stable session coloring
//
// Each session maps to a palette entry through a hash of its id, so the
// color survives reconnects, re-renders, and process restarts. Collisions
// are acceptable once more sessions are visible than the palette holds.

use sha2::{Digest, Sha256};

/// Fixed palette, sized so a typical handful of concurrent sessions gets
/// distinct colors.
pub const PALETTE: [&str; 12] = [
    "#e06c75", "#61afef", "#98c379", "#c678dd", "#e5c07b", "#56b6c2",
    "#d19a66", "#7f9f7f", "#dc8cc3", "#8cd0d3", "#f0dfaf", "#93e0e3",
];

/// Deterministically pick a palette color for a session id.
pub fn color_for(session_id: &str) -> &'static str {
    let digest = Sha256::digest(session_id.as_bytes());
    let n = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    PALETTE[n as usize % PALETTE.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_is_stable() {
        let a = color_for("session_abc123");
        let b = color_for("session_abc123");
        assert_eq!(a, b);
        assert!(PALETTE.contains(&a));
    }

    #[test]
    fn test_different_sessions_usually_differ() {
        // Not guaranteed in general, but these particular ids must not
        // collide for the palette to be useful at all.
        let distinct: std::collections::HashSet<_> =
            (0..6).map(|i| color_for(&format!("session_{i}"))).collect();
        assert!(distinct.len() > 1);
    }
}
