//! services/document_service.rs
//! Validación y formato de CPF (11 dígitos) y CNPJ (14 dígitos).

use crate::models::document_model::DocumentKind;

const CNPJ_WEIGHTS_FIRST: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
const CNPJ_WEIGHTS_SECOND: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

/// Solo los dígitos ASCII del texto
pub fn clean(text: &str) -> String {
    text.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Hasta 11 dígitos se trata como CPF, hasta 14 como CNPJ
pub fn detect_kind(text: &str) -> Option<DocumentKind> {
    match clean(text).len() {
        0..=11 => Some(DocumentKind::Cpf),
        12..=14 => Some(DocumentKind::Cnpj),
        _ => None,
    }
}

pub fn kind_name(text: &str) -> &'static str {
    match clean(text).len() {
        11 => "CPF",
        14 => "CNPJ",
        _ => "Documento",
    }
}

pub fn validate(text: &str) -> bool {
    let digits = to_digits(&clean(text));
    match digits.len() {
        11 => validate_cpf_digits(&digits),
        14 => validate_cnpj_digits(&digits),
        _ => false,
    }
}

pub fn validate_cpf(text: &str) -> bool {
    let digits = to_digits(&clean(text));
    digits.len() == 11 && validate_cpf_digits(&digits)
}

pub fn validate_cnpj(text: &str) -> bool {
    let digits = to_digits(&clean(text));
    digits.len() == 14 && validate_cnpj_digits(&digits)
}

/// Aplica la máscara según la cantidad de dígitos, también sobre entradas parciales.
/// No valida. Más de 14 dígitos se recortan a 14.
pub fn format(text: &str) -> String {
    let digits = clean(text);
    if digits.len() <= 11 {
        apply_mask(&digits, &[3, 3, 3, 2], &['.', '.', '-'])
    } else {
        let digits: String = digits.chars().take(14).collect();
        apply_mask(&digits, &[2, 3, 3, 4, 2], &['.', '.', '/', '-'])
    }
}

fn apply_mask(digits: &str, groups: &[usize], separators: &[char]) -> String {
    let mut out = String::with_capacity(digits.len() + separators.len());
    let mut rest = digits;

    for (i, size) in groups.iter().enumerate() {
        if rest.is_empty() {
            break;
        }
        if i > 0 {
            out.push(separators[i - 1]);
        }
        let take = (*size).min(rest.len());
        out.push_str(&rest[..take]);
        rest = &rest[take..];
    }
    out
}

fn to_digits(clean: &str) -> Vec<u32> {
    clean.chars().filter_map(|c| c.to_digit(10)).collect()
}

fn all_same(digits: &[u32]) -> bool {
    digits.windows(2).all(|w| w[0] == w[1])
}

fn validate_cpf_digits(digits: &[u32]) -> bool {
    if all_same(digits) {
        return false;
    }

    // Pesos 10..2 para el primer dígito y 11..2 para el segundo
    let check = |len: usize| -> u32 {
        let sum: u32 = digits[..len]
            .iter()
            .enumerate()
            .map(|(i, d)| d * (len as u32 + 1 - i as u32))
            .sum();
        match (sum * 10) % 11 {
            10 | 11 => 0,
            r => r,
        }
    };

    check(9) == digits[9] && check(10) == digits[10]
}

fn validate_cnpj_digits(digits: &[u32]) -> bool {
    if all_same(digits) {
        return false;
    }

    let check = |weights: &[u32]| -> u32 {
        let sum: u32 = digits.iter().zip(weights).map(|(d, w)| d * w).sum();
        match sum % 11 {
            r if r < 2 => 0,
            r => 11 - r,
        }
    };

    check(&CNPJ_WEIGHTS_FIRST) == digits[12] && check(&CNPJ_WEIGHTS_SECOND) == digits[13]
}
