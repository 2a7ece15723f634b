//! Stopword filtering for classifier input.
//!
//! The cleaned text is only ever fed to the zero-shot model. Keyword overrides
//! and replies work on the original text.

use std::collections::HashSet;
use std::sync::LazyLock;

/// Portuguese stopwords (the NLTK `portuguese` corpus list).
static STOPWORDS_PT: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "a", "à", "ao", "aos", "aquela", "aquelas", "aquele", "aqueles", "aquilo", "as", "às",
        "até", "com", "como", "da", "das", "de", "dela", "delas", "dele", "deles", "depois", "do",
        "dos", "e", "é", "ela", "elas", "ele", "eles", "em", "entre", "era", "eram", "éramos",
        "essa", "essas", "esse", "esses", "esta", "está", "estamos", "estão", "estar", "estas",
        "estava", "estavam", "estávamos", "este", "esteja", "estejam", "estejamos", "estes",
        "esteve", "estive", "estivemos", "estiver", "estivera", "estiveram", "estivéramos",
        "estiverem", "estivermos", "estivesse", "estivessem", "estivéssemos", "estou", "eu",
        "foi", "fomos", "for", "fora", "foram", "fôramos", "forem", "formos", "fosse", "fossem",
        "fôssemos", "fui", "há", "haja", "hajam", "hajamos", "hão", "havemos", "haver", "hei",
        "houve", "houvemos", "houver", "houvera", "houverá", "houveram", "houvéramos",
        "houverão", "houverei", "houverem", "houveremos", "houveria", "houveriam",
        "houveríamos", "houvermos", "houvesse", "houvessem", "houvéssemos", "isso", "isto", "já",
        "lhe", "lhes", "mais", "mas", "me", "mesmo", "meu", "meus", "minha", "minhas", "muito",
        "na", "não", "nas", "nem", "no", "nos", "nós", "nossa", "nossas", "nosso", "nossos",
        "num", "numa", "o", "os", "ou", "para", "pela", "pelas", "pelo", "pelos", "por", "qual",
        "quando", "que", "quem", "são", "se", "seja", "sejam", "sejamos", "sem", "ser", "será",
        "serão", "serei", "seremos", "seria", "seriam", "seríamos", "seu", "seus", "só",
        "somos", "sou", "sua", "suas", "também", "te", "tem", "tém", "temos", "tenha", "tenham",
        "tenhamos", "tenho", "terá", "terão", "terei", "teremos", "teria", "teriam", "teríamos",
        "teu", "teus", "teve", "tinha", "tinham", "tínhamos", "tive", "tivemos", "tiver",
        "tivera", "tiveram", "tivéramos", "tiverem", "tivermos", "tivesse", "tivessem",
        "tivéssemos", "tu", "tua", "tuas", "um", "uma", "você", "vocês", "vos",
    ]
    .into_iter()
    .collect()
});

/// Whether a token (any case) is a Portuguese stopword.
pub fn is_stopword(token: &str) -> bool {
    STOPWORDS_PT.contains(token.to_lowercase().as_str())
}

/// Trim and drop stopword tokens, rejoining survivors with single spaces.
///
/// Tokens keep their punctuation ("está?" is not "está"). When every token is
/// a stopword the trimmed input comes back unchanged, so the model never sees
/// an empty string for non-empty input.
pub fn normalize(text: &str) -> String {
    let trimmed = text.trim();
    let kept: Vec<&str> = trimmed
        .split_whitespace()
        .filter(|token| !is_stopword(token))
        .collect();

    if kept.is_empty() {
        trimmed.to_string()
    } else {
        kept.join(" ")
    }
}
