//! Single-stage compilation: parse, validate and reflect a WGSL module with naga.

use crate::device::{ActiveUniform, ShaderStage, UniformLocation};

/// A `@location` input or output of an entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Varying {
    pub name: String,
    pub location: u32,
    pub components: u32,
}

/// Reflection of a stage that compiled successfully.
#[derive(Debug, Clone)]
pub(crate) struct CompiledStage {
    pub entry_point: String,
    pub inputs: Vec<Varying>,
    pub outputs: Vec<Varying>,
    pub uniforms: Vec<ActiveUniform>,
}

/// Compiles `source` as `stage`. The error is the full diagnostic log.
pub(crate) fn compile(stage: ShaderStage, source: &str) -> Result<CompiledStage, String> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| e.emit_to_string(source))?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    validator
        .validate(&module)
        .map_err(|e| e.emit_to_string(source))?;

    let entry = module
        .entry_points
        .iter()
        .find(|ep| ep.stage == stage.to_naga())
        .ok_or_else(|| format!("error: no @{stage} entry point in {stage} shader source"))?;

    let mut inputs = Vec::new();
    for arg in &entry.function.arguments {
        collect_located(&module, arg.name.as_deref(), arg.ty, arg.binding.as_ref(), &mut inputs);
    }

    let mut outputs = Vec::new();
    if let Some(result) = &entry.function.result {
        collect_located(&module, None, result.ty, result.binding.as_ref(), &mut outputs);
    }

    let uniforms = module
        .global_variables
        .iter()
        .filter(|(_, var)| var.space == naga::AddressSpace::Uniform)
        .filter_map(|(_, var)| {
            let binding = var.binding.as_ref()?;
            Some(ActiveUniform {
                name: var.name.clone().unwrap_or_default(),
                location: UniformLocation {
                    group: binding.group,
                    binding: binding.binding,
                },
                size: module.types[var.ty].inner.size(module.to_ctx()),
            })
        })
        .collect();

    Ok(CompiledStage {
        entry_point: entry.name.clone(),
        inputs,
        outputs,
        uniforms,
    })
}

/// Flattens an entry-point argument or result into its `@location` members.
///
/// Built-ins are skipped; unbound structs are walked member by member.
fn collect_located(
    module: &naga::Module,
    name: Option<&str>,
    ty: naga::Handle<naga::Type>,
    binding: Option<&naga::Binding>,
    out: &mut Vec<Varying>,
) {
    match binding {
        Some(naga::Binding::Location { location, .. }) => out.push(Varying {
            name: name.unwrap_or_default().to_string(),
            location: *location,
            components: components(&module.types[ty].inner),
        }),
        Some(naga::Binding::BuiltIn(_)) => {}
        None => {
            if let naga::TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for m in members {
                    collect_located(module, m.name.as_deref(), m.ty, m.binding.as_ref(), out);
                }
            }
        }
    }
}

fn components(inner: &naga::TypeInner) -> u32 {
    match inner {
        naga::TypeInner::Vector { size, .. } => *size as u32,
        _ => 1,
    }
}
