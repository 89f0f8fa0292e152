use std::collections::BTreeSet;

use indexmap::IndexMap;

use resgen_core::compile::{CompiledSpec, Endpoint};
use resgen_core::config::GenConfig;
use resgen_core::docs::DocOverrides;
use resgen_core::genctx::GenContext;
use resgen_core::naming::{normalize_name, NormalizedName};
use resgen_core::warnings::Warning;
use resgen_core::GeneratedFile;

use crate::components::header;
use crate::schemas::lower_schema;
use crate::types::{lower_type, AuxDefs};

/// Endpoints grouped into emission modules, after tag filtering.
pub fn group_endpoints<'a>(
    endpoints: &'a [Endpoint],
    config: &GenConfig,
) -> IndexMap<NormalizedName, Vec<&'a Endpoint>> {
    let mut groups: IndexMap<NormalizedName, Vec<&Endpoint>> = IndexMap::new();

    for endpoint in endpoints {
        if !config.include_tags.is_empty()
            && !endpoint.tags.iter().any(|t| config.include_tags.contains(t))
        {
            continue;
        }
        if endpoint.tags.iter().any(|t| config.exclude_tags.contains(t)) {
            continue;
        }

        let group = if config.module_per_tag {
            endpoint.tags.first().map(String::as_str).unwrap_or("default")
        } else {
            "api"
        };
        groups
            .entry(normalize_name(group))
            .or_default()
            .push(endpoint);
    }

    groups
}

/// Emit one file per endpoint group: a request/response type+schema module
/// per endpoint plus its call declaration.
pub fn emit_endpoint_modules(
    compiled: &CompiledSpec,
    config: &GenConfig,
    overrides: &DocOverrides,
    module_prefix: Option<String>,
) -> (Vec<GeneratedFile>, Vec<Warning>) {
    let available: BTreeSet<String> = compiled.schemas.names().map(str::to_string).collect();
    let groups = group_endpoints(&compiled.endpoints, config);

    let mut files = Vec::new();
    let mut warnings = Vec::new();

    for (group, endpoints) in &groups {
        let mut out = String::new();
        out.push_str(&header(&compiled.info.title, &compiled.info.version));

        for &endpoint in endpoints {
            let (code, mut w) = emit_endpoint(
                endpoint,
                &group.original,
                overrides,
                available.clone(),
                module_prefix.clone(),
            );
            out.push('\n');
            out.push_str(&code);
            warnings.append(&mut w);
        }

        let path = if group.pascal_case == "Api" {
            "Api.res".to_string()
        } else {
            format!("{}Api.res", group.pascal_case)
        };
        files.push(GeneratedFile { path, content: out });
    }

    (files, warnings)
}

fn emit_endpoint(
    endpoint: &Endpoint,
    group: &str,
    overrides: &DocOverrides,
    available: BTreeSet<String>,
    module_prefix: Option<String>,
) -> (String, Vec<Warning>) {
    let module = &endpoint.name.pascal_case;
    let mut ctx = GenContext::new(module, available);
    ctx.inside_component_schemas = false;
    ctx.module_prefix = module_prefix;
    let mut aux = AuxDefs::default();

    let mut body = String::new();

    let request_ty = endpoint.request.as_ref().map(|ir| {
        ctx.push_path("request");
        let ty = lower_type(ir, &mut ctx, &mut aux, false);
        ctx.quiet = true;
        let schema = lower_schema(ir, &mut ctx, &mut aux);
        ctx.quiet = false;
        ctx.pop_path();
        (ty, schema)
    });

    let response_ty = endpoint.response.as_ref().map(|ir| {
        ctx.push_path("response");
        let ty = lower_type(ir, &mut ctx, &mut aux, false);
        ctx.quiet = true;
        let schema = lower_schema(ir, &mut ctx, &mut aux);
        ctx.quiet = false;
        ctx.pop_path();
        (ty, schema)
    });

    body.push_str(&format!("module {module} = {{\n"));
    for (_, def) in &aux.types {
        body.push_str(&indent(def, 2));
        body.push('\n');
    }
    if let Some((ty, _)) = &request_ty {
        body.push_str(&indent(&format!("type request = {ty}"), 2));
        body.push('\n');
    }
    match &response_ty {
        Some((ty, _)) => {
            body.push_str(&indent(&format!("type response = {ty}"), 2));
            body.push('\n');
        }
        None => {
            body.push_str("  type response = unit\n");
        }
    }
    for (_, def) in &aux.schemas {
        body.push_str(&indent(def, 2));
        body.push('\n');
    }
    if let Some((_, schema)) = &request_ty {
        body.push_str(&indent(
            &format!("let requestSchema: S.t<request> = {schema}"),
            2,
        ));
        body.push('\n');
    }
    if let Some((_, schema)) = &response_ty {
        body.push_str(&indent(
            &format!("let responseSchema: S.t<response> = {schema}"),
            2,
        ));
        body.push('\n');
    }
    body.push_str("}\n\n");

    // Effective description: a current override wins, a stale one is
    // reported and skipped.
    let default_doc = endpoint
        .description
        .as_deref()
        .or(endpoint.summary.as_deref());
    let resolved = overrides.description_for(
        group,
        &endpoint.name.camel_case,
        &endpoint.fingerprint,
        default_doc,
    );
    if let Some(resolved) = &resolved {
        if resolved.stale {
            log::warn!(
                "doc override for {}/{} is stale; using the spec description",
                group,
                endpoint.name.camel_case
            );
        }
        body.push_str(&format!("/** {} */\n", resolved.text.replace("*/", "*\\/")));
    }

    body.push_str(&call_declaration(endpoint, &request_ty, &response_ty));

    (body, ctx.take_warnings())
}

/// The call signature depends on whether a body exists, whether it is
/// required, and whether the response carries a payload.
fn call_declaration(
    endpoint: &Endpoint,
    request: &Option<(String, String)>,
    response: &Option<(String, String)>,
) -> String {
    let fn_name = &endpoint.name.camel_case;
    let module = &endpoint.name.pascal_case;
    let method = endpoint.method.as_str();
    let path = &endpoint.path;

    let mut params = vec!["client: Client.t".to_string()];
    let mut body_arg = String::new();
    if request.is_some() {
        if endpoint.request_required {
            params.push(format!("body: {module}.request"));
            body_arg = format!(
                ", ~body=S.reverseConvertToJsonOrThrow(body, {module}.requestSchema)"
            );
        } else {
            params.push(format!("~body: option<{module}.request>=?"));
            body_arg = format!(
                ", ~body=?Option.map(body, b => S.reverseConvertToJsonOrThrow(b, {module}.requestSchema))"
            );
        }
    }

    match response {
        Some(_) => format!(
            "let {fn_name} = ({}): promise<{module}.response> =>\n  client->Client.call(#{method}, \"{path}\"{body_arg}, ~responseSchema={module}.responseSchema)\n",
            params.join(", "),
        ),
        None => format!(
            "let {fn_name} = ({}): promise<unit> =>\n  client->Client.callUnit(#{method}, \"{path}\"{body_arg})\n",
            params.join(", "),
        ),
    }
}

/// The wrapper target: a minimal fetch-backed client the endpoint modules
/// call into.
pub fn emit_client() -> String {
    let mut out = String::new();
    out.push_str("// Generated by resgen. Do not edit.\n\n");
    out.push_str("type t = {\n  baseUrl: string,\n  headers: dict<string>,\n}\n\n");
    out.push_str("let make = (~baseUrl: string, ~headers: dict<string>=Dict.make()) => {\n");
    out.push_str("  baseUrl,\n  headers,\n}\n\n");
    out.push_str(
        "let call = async (client: t, method, path: string, ~body: option<JSON.t>=?, ~responseSchema: S.t<'a>): 'a => {\n",
    );
    out.push_str("  let json = await Fetch.request(client.baseUrl, client.headers, method, path, body)\n");
    out.push_str("  S.parseJsonOrThrow(json, responseSchema)\n");
    out.push_str("}\n\n");
    out.push_str(
        "let callUnit = async (client: t, method, path: string, ~body: option<JSON.t>=?): unit => {\n",
    );
    out.push_str("  let _ = await Fetch.request(client.baseUrl, client.headers, method, path, body)\n");
    out.push_str("}\n");
    out
}

fn indent(text: &str, spaces: usize) -> String {
    let pad = " ".repeat(spaces);
    text.lines()
        .map(|line| {
            if line.is_empty() {
                line.to_string()
            } else {
                format!("{pad}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use resgen_core::compile::compile;
    use resgen_core::document;

    const SPEC: &str = r#"
openapi: 3.1.0
info:
  title: T
  version: "1"
paths:
  /notes/create:
    post:
      operationId: createNote
      tags: [notes]
      description: Creates a note.
      requestBody:
        required: true
        content:
          application/json:
            schema:
              type: object
              required: [text]
              properties:
                text:
                  type: string
      responses:
        "200":
          description: ok
          content:
            application/json:
              schema:
                $ref: '#/components/schemas/Note'
  /notes/delete:
    post:
      operationId: deleteNote
      tags: [notes]
      requestBody:
        required: true
        content:
          application/json:
            schema:
              type: object
              required: [noteId]
              properties:
                noteId:
                  type: string
      responses:
        "204":
          description: gone
  /ping:
    get:
      operationId: ping
      tags: [meta]
      responses:
        "200":
          description: ok
          content:
            application/json:
              schema:
                type: object
                required: [pong]
                properties:
                  pong:
                    type: boolean
components:
  schemas:
    Note:
      type: object
      required: [id, text]
      properties:
        id:
          type: string
        text:
          type: string
"#;

    fn emitted(config: &GenConfig) -> Vec<GeneratedFile> {
        let compiled = compile(&document::from_yaml(SPEC).unwrap()).unwrap();
        let (files, _) =
            emit_endpoint_modules(&compiled, config, &DocOverrides::default(), None);
        files
    }

    #[test]
    fn groups_by_tag() {
        let files = emitted(&GenConfig::default());
        let names: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(names, ["NotesApi.res", "MetaApi.res"]);
    }

    #[test]
    fn flat_module_when_grouping_disabled() {
        let config = GenConfig {
            module_per_tag: false,
            ..GenConfig::default()
        };
        let files = emitted(&config);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "Api.res");
    }

    #[test]
    fn tag_filters_apply() {
        let config = GenConfig {
            exclude_tags: vec!["meta".to_string()],
            ..GenConfig::default()
        };
        let files = emitted(&config);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "NotesApi.res");
    }

    #[test]
    fn request_and_response_pairs_are_emitted() {
        let files = emitted(&GenConfig::default());
        let notes = &files[0].content;
        assert!(notes.contains("module CreateNote = {"));
        assert!(notes.contains("  type request = {"));
        assert!(notes.contains("  type response = Schemas.Note.t"));
        assert!(notes.contains("let requestSchema: S.t<request> = S.object(s => {"));
        assert!(notes.contains("let responseSchema: S.t<response> = Schemas.Note.schema"));
    }

    #[test]
    fn unit_response_uses_call_unit() {
        let files = emitted(&GenConfig::default());
        let notes = &files[0].content;
        assert!(notes.contains("module DeleteNote = {"));
        assert!(notes.contains("  type response = unit"));
        assert!(notes
            .contains("let deleteNote = (client: Client.t, body: DeleteNote.request): promise<unit> =>"));
        assert!(notes.contains("client->Client.callUnit(#POST, \"/notes/delete\""));
    }

    #[test]
    fn bodyless_call_has_no_body_argument() {
        let files = emitted(&GenConfig::default());
        let meta = &files[1].content;
        assert!(meta.contains("let ping = (client: Client.t): promise<Ping.response> =>"));
        assert!(!meta.contains("~body"));
    }

    #[test]
    fn description_becomes_doc_comment() {
        let files = emitted(&GenConfig::default());
        assert!(files[0].content.contains("/** Creates a note. */"));
    }

    #[test]
    fn override_replaces_description_when_current() {
        let compiled = compile(&document::from_yaml(SPEC).unwrap()).unwrap();
        let fingerprint = compiled.endpoints[0].fingerprint.clone();
        let content = resgen_core::docs::render_override_template(
            "/notes/create",
            "POST",
            &fingerprint,
            Some("createNote"),
            "Creates a note.",
        )
        .replace(
            resgen_core::docs::OVERRIDE_PLACEHOLDER,
            "Creates a note (rate limited).",
        );
        let overrides =
            DocOverrides::from_files([("notes/createNote.md", content.as_str())]).unwrap();
        let (files, _) =
            emit_endpoint_modules(&compiled, &GenConfig::default(), &overrides, None);
        assert!(files[0]
            .content
            .contains("/** Creates a note (rate limited). */"));
    }
}
