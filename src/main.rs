fn main() {
    coursekit::app::cli::run();
}
