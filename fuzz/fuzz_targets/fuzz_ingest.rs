#![no_main]

use libfuzzer_sys::fuzz_target;

use gangliostat::ingest::read_records;
use gangliostat::pipeline::Pipeline;

fuzz_target!(|data: &[u8]| {
    // Ingestion must either produce records or fail gracefully, never panic.
    let Ok(records) = read_records(data) else {
        return;
    };

    // Any table the ingester accepts must classify without panicking.
    let report = Pipeline::default().run(&records);
    assert_eq!(
        report.statistics.total_rows,
        report.statistics.total_compounds + report.statistics.malformed
    );
});
