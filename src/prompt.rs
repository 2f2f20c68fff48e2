use serde_json::{Value, json};

/// Line prefix for every specification bullet, in both languages.
pub const BULLET: &str = "▪️";

pub const ENGLISH_FIELD: &str = "englishSpecs";
pub const ARABIC_FIELD: &str = "arabicSpecs";

/// Build the instruction sent to the model. The description is embedded as given.
pub fn build_prompt(description: &str) -> String {
    format!(
        r#"You are a product copywriter. Write detailed product specifications for the product described below.

Respond with a JSON object that has exactly two string properties:
- "{english}": the specifications in English.
- "{arabic}": the same specifications written in Arabic.

Each property must contain newline-separated bullet points. Every line must start with "{bullet} ".
Cover the product's features, functionality, technical details and benefits.
Do not add any text outside the JSON object.

Product description:
{description}"#,
        english = ENGLISH_FIELD,
        arabic = ARABIC_FIELD,
        bullet = BULLET,
        description = description,
    )
}

/// Schema for the structured answer: two required string properties.
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            ENGLISH_FIELD: {
                "type": "STRING",
                "description": format!("English specifications, one '{BULLET}' bullet per line")
            },
            ARABIC_FIELD: {
                "type": "STRING",
                "description": format!("Arabic specifications, one '{BULLET}' bullet per line")
            }
        },
        "required": [ENGLISH_FIELD, ARABIC_FIELD]
    })
}
