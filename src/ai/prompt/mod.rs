//! Prompt Builder System
//!
//! Standardized prompt construction for the assistant helpers.
//!
//! ## Design Principles
//!
//! 1. **Role Definition**: Clear AI role for each task
//! 2. **Structured Objectives**: Numbered goals
//! 3. **Context Sections**: Ordered key-value input data
//! 4. **Output Schema**: JSON shape the reply must follow

/// Prompt section types
#[derive(Debug, Clone)]
pub enum PromptSection {
    /// Role definition with expertise area
    Role { expertise: String, task: String },
    /// Numbered objectives
    Objectives(Vec<String>),
    /// Context as ordered key-value pairs
    Context(Vec<(String, String)>),
    /// Raw text section with optional header
    Text {
        header: Option<String>,
        content: String,
    },
    /// Caller-supplied document, fenced off from instructions
    Document { label: String, content: String },
    /// JSON-only reply following an example shape
    OutputSchema(String),
}

/// Prompt builder for consistent prompt construction
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    sections: Vec<PromptSection>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn role(mut self, expertise: &str, task: &str) -> Self {
        self.sections.push(PromptSection::Role {
            expertise: expertise.to_string(),
            task: task.to_string(),
        });
        self
    }

    pub fn objectives(mut self, objectives: &[&str]) -> Self {
        self.sections.push(PromptSection::Objectives(
            objectives.iter().map(|o| o.to_string()).collect(),
        ));
        self
    }

    /// Add a context item, appending to the existing context section
    pub fn context_item(mut self, key: &str, value: &str) -> Self {
        let item = (key.to_string(), value.to_string());
        match self.sections.iter_mut().find_map(|s| match s {
            PromptSection::Context(items) => Some(items),
            _ => None,
        }) {
            Some(items) => items.push(item),
            None => self.sections.push(PromptSection::Context(vec![item])),
        }
        self
    }

    pub fn text(mut self, content: &str) -> Self {
        self.sections.push(PromptSection::Text {
            header: None,
            content: content.to_string(),
        });
        self
    }

    pub fn section(mut self, header: &str, content: &str) -> Self {
        self.sections.push(PromptSection::Text {
            header: Some(header.to_string()),
            content: content.to_string(),
        });
        self
    }

    pub fn document(mut self, label: &str, content: &str) -> Self {
        self.sections.push(PromptSection::Document {
            label: label.to_string(),
            content: content.to_string(),
        });
        self
    }

    pub fn output_schema(mut self, example: &str) -> Self {
        self.sections
            .push(PromptSection::OutputSchema(example.to_string()));
        self
    }

    /// Build the final prompt string
    pub fn build(self) -> String {
        let mut prompt = String::new();

        for section in self.sections {
            match section {
                PromptSection::Role { expertise, task } => {
                    prompt.push_str("<ROLE>\n");
                    prompt.push_str(&format!(
                        "You are an expert {} specializing in {}.\n",
                        expertise, task
                    ));
                    prompt.push_str("</ROLE>\n\n");
                }
                PromptSection::Objectives(objectives) => {
                    prompt.push_str("<OBJECTIVES>\n");
                    for (i, obj) in objectives.iter().enumerate() {
                        prompt.push_str(&format!("{}. {}\n", i + 1, obj));
                    }
                    prompt.push_str("</OBJECTIVES>\n\n");
                }
                PromptSection::Context(items) => {
                    prompt.push_str("# Context\n\n");
                    for (key, value) in items {
                        prompt.push_str(&format!("**{}**: {}\n", key, value));
                    }
                    prompt.push('\n');
                }
                PromptSection::Text { header, content } => {
                    if let Some(h) = header {
                        prompt.push_str(&format!("# {}\n\n", h));
                    }
                    prompt.push_str(&content);
                    prompt.push_str("\n\n");
                }
                PromptSection::Document { label, content } => {
                    prompt.push_str(&format!("<{}>\n", label));
                    prompt.push_str(content.trim());
                    prompt.push_str(&format!("\n</{}>\n\n", label));
                }
                PromptSection::OutputSchema(example) => {
                    prompt.push_str("<OUTPUT_FORMAT>\n");
                    prompt.push_str(
                        "Respond with JSON only, no prose and no code fences, matching:\n",
                    );
                    prompt.push_str(example.trim());
                    prompt.push_str("\n</OUTPUT_FORMAT>\n\n");
                }
            }
        }

        prompt.trim_end().to_string()
    }
}

/// Preset prompt templates for the assistant helpers
pub struct PromptTemplates;

impl PromptTemplates {
    pub fn chat_system() -> String {
        PromptBuilder::new()
            .role(
                "business assistant",
                "CRM, sales pipeline, quoting and contract questions",
            )
            .text("Answer concisely. Say so when you are unsure instead of guessing.")
            .build()
    }

    pub fn contract_drafting(brief: &str) -> PromptBuilder {
        PromptBuilder::new()
            .role("commercial contracts lawyer", "drafting service agreements")
            .objectives(&[
                "Draft a complete contract from the brief below",
                "Use numbered clauses with clear headings",
                "Mark every value missing from the brief as [TO BE CONFIRMED]",
            ])
            .document("brief", brief)
    }

    pub fn contract_analysis(contract: &str) -> PromptBuilder {
        PromptBuilder::new()
            .role("legal analyst", "contract risk review")
            .objectives(&[
                "Summarize the contract in two or three sentences",
                "List the key terms: parties, duration, payment, termination",
                "Identify risks for our side and rate the overall risk",
                "Recommend concrete changes",
            ])
            .document("contract", contract)
            .output_schema(
                r#"{"summary": "", "key_terms": [""], "risks": [""], "risk_level": "low|medium|high", "recommendations": [""]}"#,
            )
    }

    pub fn lead_generation(criteria: &str, count: usize) -> PromptBuilder {
        PromptBuilder::new()
            .role("B2B sales researcher", "prospect qualification")
            .objectives(&[
                &format!("Suggest {} prospective companies matching the criteria", count),
                "Explain in one sentence why each one fits",
                "Score each fit from 0 to 100",
            ])
            .context_item("Criteria", criteria)
            .output_schema(
                r#"[{"company": "", "industry": "", "contact_role": "", "reason": "", "score": 0}]"#,
            )
    }
}
