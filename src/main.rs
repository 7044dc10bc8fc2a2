fn main() {
    if let Err(err) = breakdown_canvas::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
