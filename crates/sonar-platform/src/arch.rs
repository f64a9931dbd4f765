/// Whether the host is an ARM64 machine.
///
/// Homebrew uses `/opt/homebrew` as its prefix on Apple Silicon and
/// `/usr/local` on Intel; path fallbacks key off this.
#[must_use]
pub fn is_arm64() -> bool {
    std::env::consts::ARCH == "aarch64"
}
