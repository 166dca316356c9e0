use crate::types::Batch;

/// 所有Worker共用的调研指令模板
pub const BASE_INSTRUCTION: &str = r###"You are writing a comprehensive brand audit for **{brand}**.

IMPORTANT CITATION REQUIREMENTS:
- For every claim made, include a citation in the format [1], [2], [3], etc.
- Keep track of all sources used and include them in your response
- At the end of your response, include a single "Sources Used:" section listing every source as "[n] Title. Website. Date. URL"
- Use primary sources, do NOT use Wikipedia
- Include direct links to sources when possible

Write exactly the sections below, in the given order. Start each section with a heading of the form "## <number>. <section name>".

{section_specific_instructions}

Research Guidelines:
- Use web search to find current, verified information
- Prioritize official brand sources, press releases, financial reports
- Include recent news and developments (within last 12 months)
- Cross-reference information from multiple sources
- If data is unavailable, state "Data unavailable" rather than guessing
- If can not find data search on the web

Citation Format:
- Use [1], [2], [3] format throughout
- Include source URLs in the "Sources Used:" section
- Make sure every factual claim has a citation

Your response should be detailed, well-researched, and properly cited.
"###;

/// 替换模板中的 `{brand}` 与 `{section_specific_instructions}` 占位符
pub fn render_prompt(template: &str, brand: &str, instructions: &str) -> String {
    template
        .replace("{brand}", brand)
        .replace("{section_specific_instructions}", instructions)
}

/// 按批次内顺序拼接各章节的编号、名称与要点
pub fn section_instructions(batch: &Batch) -> String {
    let mut instructions = String::new();
    for section in &batch.sections {
        instructions.push_str(&format!(
            "\n{}. {}\n{}\n",
            section.ordinal, section.name, section.instructions
        ));
    }
    instructions
}

/// 用户侧的简短请求
pub fn worker_request(batch: &Batch, brand: &str) -> String {
    format!(
        "Research and write sections {}-{} of the brand audit for {}.",
        batch.start_ordinal,
        batch.end_ordinal(),
        brand
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::research::{catalog, planner};

    #[test]
    fn test_render_prompt_fills_placeholders() {
        let rendered = render_prompt(BASE_INSTRUCTION, "Nike", "\n1. Origin Story\n");

        assert!(rendered.contains("brand audit for **Nike**"));
        assert!(rendered.contains("\n1. Origin Story\n"));
        assert!(!rendered.contains("{brand}"));
        assert!(!rendered.contains("{section_specific_instructions}"));
    }

    #[test]
    fn test_section_instructions_follow_batch_order() {
        let batches = planner::plan(&catalog::sections(), planner::BATCH_SIZE);
        let text = section_instructions(&batches[1]);

        let macro_forces = text.find("4. Macro Forces").unwrap();
        let other = text.find("5. Other Categories Involved In").unwrap();
        let revenue = text.find("6. Revenue Streams").unwrap();
        assert!(macro_forces < other && other < revenue);
        assert!(!text.contains("Origin Story"));
    }

    #[test]
    fn test_worker_request_names_range() {
        let batches = planner::plan(&catalog::sections(), planner::BATCH_SIZE);
        assert_eq!(
            worker_request(&batches[5], "lululemon"),
            "Research and write sections 16-18 of the brand audit for lululemon."
        );
    }
}
