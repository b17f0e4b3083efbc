use super::InputError;

/// Instruction asking the service for a topical map of `topic` as JSON.
pub fn build_prompt(topic: &str) -> Result<String, InputError> {
	let topic = topic.trim();
	if topic.is_empty() {
		return Err(InputError::EmptyTopic);
	}

	Ok(format!(
		r#"Act as an expert SEO content strategist. Your task is to create a detailed topical map for the main topic: "{topic}".

Structure your response as a valid JSON object with the following schema:
{{
  "pillar_topic": "The main, overarching topic provided.",
  "clusters": [
    {{
      "cluster_title": "A logical sub-topic or category related to the pillar.",
      "pages": [
        {{
          "page_title": "A specific, long-tail article title or question that falls under the cluster.",
          "keywords": ["a list", "of 5-7 relevant", "long-tail keywords"],
          "word_count": "A suggested word count for the article, e.g., 1200"
        }}
      ]
    }}
  ]
}}

Generate at least 4-6 relevant clusters. For each cluster, generate at least 4-6 specific page topics. Ensure the keywords are highly relevant and practical for SEO. The page titles should be engaging and answer specific user intents."#
	))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn rejects_blank_topics() {
		assert_eq!(build_prompt(""), Err(InputError::EmptyTopic));
		assert_eq!(build_prompt(" \t\n"), Err(InputError::EmptyTopic));
	}

	#[test]
	fn embeds_trimmed_topic() {
		let prompt = build_prompt("  Digital Marketing Strategies ").unwrap();
		assert!(prompt.contains(r#"main topic: "Digital Marketing Strategies"."#));
	}

	#[test]
	fn requests_schema_and_volume() {
		let prompt = build_prompt("Coffee").unwrap();
		for field in ["\"pillar_topic\"", "\"clusters\"", "\"cluster_title\"", "\"pages\"", "\"page_title\"", "\"keywords\"", "\"word_count\""] {
			assert!(prompt.contains(field), "missing {field}");
		}
		assert!(prompt.contains("at least 4-6 relevant clusters"));
		assert!(prompt.contains("at least 4-6 specific page topics"));
	}
}
