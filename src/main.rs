fn main() {
    if let Err(err) = annotation_markers::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
