pub mod order_line_reader;
pub mod report_writer;

pub use order_line_reader::OrderLineReader;
pub use report_writer::ReportWriter;
