//! services/variation_service.rs
//! Genera variaciones de un mensaje con IA, por lotes secuenciales.

use std::collections::HashSet;

use crate::config::app_config::DEFAULT_MAX_VARIATIONS;
use crate::errors::AppError;
use crate::models::support_chat_model::ChatMessage;
use crate::services::ai_gateway_service::AiGatewayService;

/// Más creatividad para evitar repeticiones
const VARIATION_TEMPERATURE: f32 = 0.9;

#[derive(Clone)]
pub struct VariationService {
    gateway: AiGatewayService,
    batch_size: usize,
    max_variations: usize,
}

impl VariationService {
    pub fn new(gateway: AiGatewayService, batch_size: usize) -> Self {
        VariationService {
            gateway,
            batch_size: batch_size.max(1),
            max_variations: DEFAULT_MAX_VARIATIONS,
        }
    }

    pub fn with_max_variations(mut self, max_variations: usize) -> Self {
        self.max_variations = max_variations.max(1);
        self
    }

    /// Devuelve exactamente `max(count, 1)` mensajes; el primero es el original.
    /// Un `count` mayor al tope configurado se rechaza antes de llamar a la IA.
    ///
    /// Cada lote recibe en el prompt todo lo generado antes, por eso los lotes
    /// no pueden ir en paralelo. Si un lote trae menos líneas útiles de las
    /// pedidas, se completa con copias numeradas del original.
    pub async fn generate(&self, original: &str, count: usize) -> Result<Vec<String>, AppError> {
        if original.trim().is_empty() {
            return Err(AppError::EmptyMessage);
        }
        if count > self.max_variations {
            return Err(AppError::ValidationFailed(format!(
                "count must be at most {}",
                self.max_variations
            )));
        }

        let to_generate = count.max(1) - 1;
        if to_generate == 0 {
            return Ok(vec![original.to_string()]);
        }

        let total_batches = to_generate.div_ceil(self.batch_size);
        log::info!(
            "(generate) Generando {} variaciones en {} lotes",
            to_generate,
            total_batches
        );

        let mut variations: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::from([original.trim().to_string()]);

        for batch in 0..total_batches {
            let batch_size = (to_generate - variations.len()).min(self.batch_size);
            log::info!(
                "(generate) Lote {}/{} con {} variaciones",
                batch + 1,
                total_batches,
                batch_size
            );

            let messages = [
                ChatMessage::system(system_prompt(batch_size, &variations)),
                ChatMessage::user(format!(
                    "Mensagem original:\n\n{}\n\nCrie {} variações ÚNICAS e DIFERENTES.",
                    original, batch_size
                )),
            ];
            let generated = self
                .gateway
                .complete(&messages, VARIATION_TEMPERATURE)
                .await?;

            let mut batch_variations = Vec::with_capacity(batch_size);
            for line in generated.lines().map(clean_line) {
                if batch_variations.len() == batch_size {
                    break;
                }
                if !line.is_empty() && seen.insert(line.to_string()) {
                    batch_variations.push(line.to_string());
                }
            }

            // Relleno con el original numerado
            while batch_variations.len() < batch_size {
                let filler = format!(
                    "{} (variação {})",
                    original,
                    variations.len() + batch_variations.len() + 1
                );
                if seen.insert(filler.clone()) {
                    batch_variations.push(filler);
                } else {
                    batch_variations.push(format!("{} ({})", filler, seen.len()));
                }
            }

            log::info!(
                "(generate) Lote {} completo: {} variaciones",
                batch + 1,
                batch_variations.len()
            );
            variations.extend(batch_variations);
        }

        let mut result = Vec::with_capacity(variations.len() + 1);
        result.push(original.to_string());
        result.extend(variations);
        Ok(result)
    }
}

fn system_prompt(batch_size: usize, previous: &[String]) -> String {
    let mut prompt = format!(
        "Você é um especialista em copywriting para WhatsApp. Crie {} variações ÚNICAS da mensagem.\n\n\
         REGRAS:\n\
         - Cada variação deve ser diferente das anteriores\n\
         - Mantenha o significado, o propósito e o tom da original\n\
         - Preserve placeholders como {{nome}} EXATAMENTE\n\
         - Tamanho parecido com a original\n\
         - Emojis apenas se a original tiver\n",
        batch_size
    );

    if !previous.is_empty() {
        prompt.push_str("\nVARIAÇÕES JÁ CRIADAS (NÃO REPETIR):\n");
        for (i, variation) in previous.iter().enumerate() {
            prompt.push_str(&format!("{}. {}\n", i + 1, variation));
        }
    }

    prompt.push_str(&format!(
        "\nRetorne APENAS as {} novas variações, uma por linha, sem numeração ou prefixos.",
        batch_size
    ));
    prompt
}

/// Quita espacios y prefijos de lista ("1. ", "2) ", "- ") que la IA a veces agrega.
pub fn clean_line(line: &str) -> &str {
    let line = line.trim();

    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(stripped) = rest.strip_prefix(". ").or_else(|| rest.strip_prefix(") ")) {
            return stripped.trim();
        }
    }

    line.strip_prefix("- ")
        .or_else(|| line.strip_prefix("• "))
        .map(str::trim)
        .unwrap_or(line)
}
