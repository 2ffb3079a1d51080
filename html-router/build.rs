fn main() {
    // Templates are always embedded so the binaries run from any working directory
    minijinja_embed::embed_templates!("templates");
}
