//! 品牌审计报告的固定章节目录。目录顺序即报告中的章节序号。

use crate::types::Section;

const FALLBACK_LINE: &str = "If can not find data, search on the web, if still can not find data state \"Data Unavailable\" [source link]";

/// (章节名称, 需要覆盖的要点)
const CATALOG: [(&str, &[&str]); 18] = [
    (
        "Origin Story",
        &[
            "How and when the brand was founded",
            "Key people involved in the founding",
            "The brand's major values",
            "Early innovations and first product launches",
        ],
    ),
    (
        "Style Mission Vision Major Shifts",
        &[
            "Brand's current mission statement",
            "Brand's vision statement",
            "Evolution of brand positioning over time",
            "Key themes in branding, packaging, and campaigns",
        ],
    ),
    (
        "Category Overview",
        &[
            "List 4-5 major categories the brand operates in",
            "Explain what brands in these categories emphasize",
            "Market positioning within each category",
        ],
    ),
    (
        "Macro Forces",
        &[
            "Market size & growth trajectory with specific statistics",
            "3-4 technology/innovation shifts and brand's adaptation",
            "Social media presence with direct profile links",
            "Cultural expectations (sustainability, DEI)",
        ],
    ),
    (
        "Other Categories Involved In",
        &[
            "3-4 adjacent categories the brand operates in",
            "When and how they entered each category",
            "Success/failure of category expansions",
        ],
    ),
    (
        "Revenue Streams",
        &[
            "Core and secondary revenue streams",
            "Financial performance (past month, year, 5 years)",
            "Budget distribution breakdowns if available",
            "Sustainability/ESG initiatives",
        ],
    ),
    (
        "Marketing Strategies",
        &[
            "Successful marketing strategies",
            "Failed marketing strategies",
            "Recent campaign reactions",
            "Political/moral stances",
            "CTAs used in marketing",
            "Ad budget allocation by channel",
            "Influencer strategies",
            "Loyalty/CRM programs",
        ],
    ),
    (
        "Media Partnerships & Agency Relationships",
        &[
            "4-5 key creative agency partners with website links",
            "5 recent brand partnerships",
            "Media buying strategies",
        ],
    ),
    (
        "Ownership Business Structure",
        &[
            "Parent companies/ownership structure",
            "Companies/brands they own",
            "4-5 subsidiary relationships",
            "Strategic value of relationships",
        ],
    ),
    (
        "Recent Developments & News",
        &[
            "4-5 recent stories from past year with links",
            "Major launches, PR moments, controversies",
            "Investments and expansions",
        ],
    ),
    (
        "Brand Perception",
        &[
            "What critics and consumers say",
            "3 major supporters/advocates",
            "3 major critics/detractors",
            "Brand sentiment analysis",
        ],
    ),
    (
        "Popular Products",
        &[
            "4-5 best-selling products with links",
            "Top trending products from past year",
            "Product performance metrics",
        ],
    ),
    (
        "Unexpected Sectors Entered",
        &[
            "3-4 unexpected sectors entered",
            "Success/failure of these ventures",
            "Strategic rationale",
        ],
    ),
    (
        "Brand Opportunities",
        &[
            "4-5 white-space market opportunities",
            "Category issues they could address",
            "Innovation gaps",
        ],
    ),
    (
        "Competitors",
        &[
            "4-5 primary competitors",
            "Competitive positioning",
            "3-4 upstarts/disruptors",
            "Market share comparisons",
        ],
    ),
    (
        "Primary Consumers",
        &[
            "Detailed demographics (age, income, race, gender)",
            "Top countries by sales volume",
            "Loyalty indicators and metrics",
            "Consumer behavior patterns",
        ],
    ),
    (
        "Strategic Behavioral Trends",
        &[
            "3 recent marketing strategy changes",
            "Effectiveness of new approaches",
            "Behavioral shifts in brand strategy",
        ],
    ),
    (
        "Advertising Spend",
        &[
            "Total annual advertising spend estimate",
            "Breakdown by channel (digital, print, TV, influencer, OOH, podcast)",
            "Estimated costs per channel",
            "Recent spend increases/decreases",
            "ROI and effectiveness metrics",
            "Compare to industry benchmarks",
        ],
    ),
];

fn render_instructions(points: &[&str]) -> String {
    let mut instructions = String::from("Cover:\n");
    for point in points {
        instructions.push_str(&format!("• {} [source link]\n", point));
    }
    instructions.push_str(FALLBACK_LINE);
    instructions
}

/// 返回全部18个章节，序号从1开始
pub fn sections() -> Vec<Section> {
    CATALOG
        .iter()
        .enumerate()
        .map(|(i, (name, points))| Section::new(i + 1, *name, render_instructions(points)))
        .collect()
}
