fn main() -> std::process::ExitCode {
    fix_lwjgl_lib::run()
}
