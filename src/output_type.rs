/// How the end-of-run summary is printed.
///
/// Integration notes:
/// - With the `cli` feature, `ValueEnum` lets this enum be used directly as a `clap` flag.
/// - Each variant maps to a branch of [`crate::report::write_summary`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum OutputType {
    /// Human-readable lines.
    #[default]
    Text,

    /// A single JSON object.
    Json,
}
