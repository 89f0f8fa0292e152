use minijinja::{context, Environment};

use resgen_core::compile::CompiledSpec;

/// Emit `wrapper.ts`: a typed fetch wrapper over the endpoint list, typed
/// against the declarations `emit_dts` produces.
pub fn emit_wrapper(compiled: &CompiledSpec) -> String {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.add_template("wrapper.ts.j2", include_str!("../templates/wrapper.ts.j2"))
        .expect("template should be valid");
    let tmpl = env.get_template("wrapper.ts.j2").unwrap();

    let endpoints: Vec<minijinja::Value> = compiled
        .endpoints
        .iter()
        .map(|e| {
            context! {
                name => e.name.camel_case.clone(),
                pascal => e.name.pascal_case.clone(),
                method => e.method.as_str(),
                path => e.path.clone(),
                has_request => e.request.is_some(),
            }
        })
        .collect();

    tmpl.render(context! {
        title => compiled.info.title.clone(),
        version => compiled.info.version.clone(),
        endpoints => endpoints,
    })
    .expect("render should succeed")
}
