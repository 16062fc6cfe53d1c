// Sample scripts are expanded into tests at compile time by `test_resources`, so
// adding or removing a sample needs to trigger a rebuild.

fn main() {
    build_deps::rerun_if_changed_paths("samples/**").expect("Sample glob should be valid");
}
