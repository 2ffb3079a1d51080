pub use minijinja::{context, Environment, Value};
pub use minijinja_embed;
use std::sync::Arc;

pub trait ProvidesTemplateEngine {
    fn template_engine(&self) -> &Arc<TemplateEngine>;
}

/// Templates compiled into the calling crate by `minijinja_embed` in its build script.
#[derive(Clone)]
pub struct TemplateEngine {
    env: Arc<Environment<'static>>,
}

#[macro_export]
macro_rules! create_template_engine {
    () => {{
        // Expands in the CALLING crate so its OUT_DIR bundle is the one loaded
        let mut env = $crate::utils::template_engine::Environment::new();
        $crate::utils::template_engine::minijinja_embed::load_templates!(&mut env);
        $crate::utils::template_engine::TemplateEngine::from_environment(env)
    }};
}

impl TemplateEngine {
    pub fn from_environment(env: Environment<'static>) -> Self {
        Self { env: Arc::new(env) }
    }

    pub fn render(&self, name: &str, ctx: &Value) -> Result<String, minijinja::Error> {
        self.env.get_template(name)?.render(ctx)
    }
}
