use std::io::Write;

use flexi_logger::{DeferredNow, Record, style};

/// `LEVEL message`, level colored when stderr is a terminal.
pub fn cli_format(
    w: &mut dyn Write,
    _now: &mut DeferredNow,
    record: &Record,
) -> Result<(), std::io::Error> {
    let level = record.level();
    write!(
        w,
        "{} {}",
        style(level).paint(level.to_string()),
        record.args()
    )
}
