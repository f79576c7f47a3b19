fn main() {
    slint_build::compile("ui/main_window.slint").expect("Failed to compile Slint UI");
}
