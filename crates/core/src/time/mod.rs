pub mod report_clock;
