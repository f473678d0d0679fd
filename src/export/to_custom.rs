use std::error::Error;
use std::fs;
use tracing::error;

use crate::build::BuildOutput;
use crate::plan::CustomExportProfile;

/// Renders with a user-supplied handlebars template read from disk.
pub fn render(
    output: &BuildOutput,
    params: &CustomExportProfile,
) -> Result<String, Box<dyn Error>> {
    let mut handlebars = crate::common::get_handlebars();

    if let Some(partials) = &params.partials {
        for (name, partial) in partials {
            match fs::read_to_string(partial) {
                Ok(partial_content) => {
                    if let Err(err) = handlebars.register_partial(name, partial_content) {
                        error!("Failed to register partial '{}': {}", name, err);
                    }
                }
                Err(err) => {
                    error!("Failed to read partial file '{}': {}", partial, err);
                    return Err(
                        format!("Failed to read partial file '{}': {}", partial, err).into(),
                    );
                }
            }
        }
    }

    let template_content = fs::read_to_string(&params.template).map_err(|err| {
        format!(
            "Failed to read template file '{}': {}",
            params.template, err
        )
    })?;

    let res = handlebars.render_template(
        &template_content,
        &crate::export::renderer::template_data(output),
    )?;
    Ok(res)
}
