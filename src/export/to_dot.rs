use std::error::Error;

use crate::build::BuildOutput;

pub fn render(output: &BuildOutput) -> Result<String, Box<dyn Error>> {
    let handlebars = crate::common::get_handlebars();
    let res = handlebars.render_template(
        &get_template(),
        &crate::export::renderer::template_data(output),
    )?;
    Ok(res)
}

pub fn get_template() -> String {
    include_str!("to_dot.hbs").to_string()
}
