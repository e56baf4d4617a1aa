//! Shared constants for end-to-end tests
//!
//! When the fake engine output or test payloads change, update only this file.

// ============================================================================
// Test Payloads
// ============================================================================

/// Stand-in for an uploaded recording. The fake engine never decodes it.
pub const TEST_AUDIO_BYTES: &[u8] = b"ID3\x04\x00\x00\x00\x00\x00\x00fake-mp3-frames";

/// Stand-in for the background image
pub const TEST_IMAGE_BYTES: &[u8] = b"\xff\xd8\xff\xe0fake-jpeg";

/// Path on the audio host serving `TEST_AUDIO_BYTES`
pub const REMOTE_AUDIO_PATH: &str = "/recordings/voice.mp3";

/// Duration reported by the fake ffprobe
pub const REPORTED_DURATION: &str = "12.5";

// ============================================================================
// Voice Selectors
// ============================================================================

/// Selector of the first declared voice profile
pub const VOICE_1: &str = "1";

/// A selector no profile declares
pub const UNKNOWN_VOICE: &str = "9";

/// Number of declared voice profiles
pub const VOICE_COUNT: usize = 4;

// ============================================================================
// Server Limits
// ============================================================================

/// Upload cap configured on the test server
pub const TEST_MAX_UPLOAD_BYTES: usize = 64 * 1024;

/// Remote audio cap configured on the test server
pub const TEST_MAX_FETCH_BYTES: u64 = 64 * 1024;

// ============================================================================
// Timeouts
// ============================================================================

/// Maximum time to wait for the server to become ready
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Timeout for individual requests
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Interval between readiness polls
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;
