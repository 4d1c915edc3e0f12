use strata::cli;

fn main() {
    // Recognized failures are reported as a single line on stdout and
    // the process still exits successfully; scripted callers compare
    // output text, not exit codes.
    if let Err(err) = cli::run() {
        println!("{err}");
    }
}
