use std::io::Write;

use crate::Result;
use crate::output_type::OutputType;
use crate::pipeline::RunSummary;

/// Write the end-of-run summary in the requested format.
pub fn write_summary<W: Write>(mut w: W, summary: &RunSummary, output: OutputType) -> Result<()> {
    match output {
        OutputType::Json => {
            serde_json::to_writer(&mut w, summary)?;
            writeln!(w)?;
        }
        OutputType::Text => {
            if summary.dry_run {
                writeln!(w, "Dry run: nothing was written.")?;
            }
            writeln!(w, "Timing files:        {}", summary.timing_files)?;
            writeln!(w, "  parse anomalies:   {}", summary.parse_anomalies)?;
            writeln!(w, "  name mismatches:   {}", summary.mismatches)?;
            writeln!(w, "  audio not found:   {}", summary.lookup_misses)?;
            writeln!(w, "  failed:            {}", summary.files_failed)?;
            writeln!(w, "Clips planned:       {}", summary.clips_planned)?;
            writeln!(w, "  written:           {}", summary.clips_written)?;
            writeln!(w, "  failed:            {}", summary.clips_failed)?;
            writeln!(w, "  already present:   {}", summary.clips_skipped_existing)?;
            writeln!(w, "  invalid interval:  {}", summary.clips_skipped_invalid)?;
        }
    }
    w.flush()?;
    Ok(())
}
