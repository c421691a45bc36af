// Prompt template for cover letter generation.
// Rendering is a single pass over the template, so braces inside user text stay literal.

use crate::generation::style::StyleParameters;

/// Cover letter adaptation prompt.
/// Placeholders: {tone}, {length}, {focus}, {job_description}, {original_letter}
pub const COVER_LETTER_PROMPT_TEMPLATE: &str = r#"You are a professional cover letter writer. Your task is to adapt an existing cover letter to match a specific job description.

Tone: {tone}
Length: {length}
Focus: {focus}

JOB DESCRIPTION:
{job_description}

ORIGINAL COVER LETTER:
{original_letter}

Please rewrite the cover letter to:
1. Match skills and qualifications mentioned in the job description
2. Maintain the writer's voice and experience
3. Highlight the most relevant experiences for this specific job
4. Be well-structured with clear paragraphs
5. Be persuasive and engaging
6. Avoid generic content
7. Keep the letter concise and focused

Format the response as a proper cover letter without any explanations or additional text."#;

/// Builds the generation prompt. Pure: the same inputs always give the same string,
/// and both texts are embedded exactly as given.
pub fn build_cover_letter_prompt(
    job_description: &str,
    original_letter: &str,
    style: &StyleParameters,
) -> String {
    render_template(
        COVER_LETTER_PROMPT_TEMPLATE,
        &[
            ("tone", style.tone.as_str()),
            ("length", style.length.as_str()),
            ("focus", style.focus.as_str()),
            ("job_description", job_description),
            ("original_letter", original_letter),
        ],
    )
}

/// Replaces `{key}` placeholders found in `template`. Substituted values are never
/// rescanned; unknown placeholders are left as-is.
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let extra: usize = vars.iter().map(|(_, v)| v.len()).sum();
    let mut out = String::with_capacity(template.len() + extra);
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let replacement = after.find('}').and_then(|end| {
            let key = &after[..end];
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, value)| (*value, end))
        });
        match replacement {
            Some((value, end)) => {
                out.push_str(value);
                rest = &after[end + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::style::{Focus, Length, Tone};

    const JD: &str = "We need a senior engineer skilled in distributed systems.\n\nRequired: Rust, Kafka.";
    const LETTER: &str = "Dear Hiring Manager,\n\nI am excited to apply...";

    #[test]
    fn test_prompt_is_deterministic() {
        let style = StyleParameters::default();
        assert_eq!(
            build_cover_letter_prompt(JD, LETTER, &style),
            build_cover_letter_prompt(JD, LETTER, &style)
        );
    }

    #[test]
    fn test_prompt_embeds_inputs_verbatim() {
        let prompt = build_cover_letter_prompt(JD, LETTER, &StyleParameters::default());
        assert!(prompt.contains(JD));
        assert!(prompt.contains(LETTER));
        assert!(prompt.contains("JOB DESCRIPTION:\n"));
        assert!(prompt.contains("ORIGINAL COVER LETTER:\n"));
    }

    #[test]
    fn test_prompt_embeds_style_values() {
        let style = StyleParameters {
            tone: Tone::Confident,
            length: Length::Detailed,
            focus: Focus::Experience,
        };
        let prompt = build_cover_letter_prompt(JD, LETTER, &style);
        assert!(prompt.contains("Tone: confident\n"));
        assert!(prompt.contains("Length: detailed\n"));
        assert!(prompt.contains("Focus: experience\n"));
    }

    #[test]
    fn test_prompt_lists_seven_requirements_and_output_rule() {
        let prompt = build_cover_letter_prompt(JD, LETTER, &StyleParameters::default());
        for n in 1..=7 {
            assert!(prompt.contains(&format!("\n{n}. ")), "missing requirement {n}");
        }
        assert!(!prompt.contains("\n8. "));
        assert!(prompt.ends_with("without any explanations or additional text."));
    }

    #[test]
    fn test_placeholders_in_user_text_are_not_expanded() {
        let jd = "Role uses {original_letter} and {tone} templating";
        let letter = "I love {job_description} and {curly} braces";
        let prompt = build_cover_letter_prompt(jd, letter, &StyleParameters::default());
        assert!(prompt.contains(jd));
        assert!(prompt.contains(letter));
        assert_eq!(prompt.matches("I love").count(), 1);
        assert_eq!(prompt.matches("Role uses").count(), 1);
    }

    #[test]
    fn test_render_template_leaves_unknown_and_unclosed_braces() {
        assert_eq!(render_template("a {x} {y} {", &[("x", "1")]), "a 1 {y} {");
        assert_eq!(render_template("{{x}}", &[("x", "1")]), "{1}");
        assert_eq!(render_template("no placeholders", &[]), "no placeholders");
    }
}
