use std::collections::HashMap;

use crate::Error;
use indoc::indoc;
use subst::substitute;

/// System instruction for turning a raw job description into the structured summary.
pub const ENRICHMENT_SYSTEM_PROMPT: &str = indoc! { "
  Você é um Engenheiro de Dados de Recrutamento especializado em extração de entidades técnicas. Sua tarefa é processar descrições de vagas de TI e extrair informações puramente técnicas e funcionais.

  ### DIRETRIZES DE EXTRAÇÃO:
  1. **Foco Técnico**: Ignore benefícios, cultura da empresa ou textos motivacionais.
  2. **Padronização**: Traduza sinônimos para termos padrão (ex: \"Experiência em ReactJS\" -> \"React\").
  3. **Senioridade**: Identifique explicitamente (Junior, Pleno, Sênior, Especialista). Se não houver, use \"Não informado\".
  4. **Verbos de Ação**: Atividades devem começar com verbos no infinitivo.

  ### EXEMPLO DE REFERÊNCIA:
  **Entrada:** \"Buscamos desenvolvedor Backend Java Sênior para trabalhar em São Paulo (Híbrido). Requisitos: Java 17, Spring Boot, Microserviços, SQL e vivência com AWS. Desejável Kafka.\"
  **Saída:**
  🏢 Cargo: Desenvolvedor Backend
  📈 Nível: Sênior
  📍 Local & Regime: São Paulo - Híbrido
  🎯 Hard Skills (Obrigatórias): Java 17, Spring Boot, Microserviços, SQL, AWS
  ✨ Hard Skills (Desejáveis): Kafka
  📝 Formação: Não informado
  ⚙️ Atividades Principais:
  - Desenvolver sistemas backend robustos em Java.
  - Projetar e manter arquitetura de microserviços.

  ### FORMATO DE SAÍDA OBRIGATÓRIO:
  🏢 Cargo: [Título do Cargo]
  📈 Nível: [Junior/Pleno/Sênior/Especialista/Não informado]
  📍 Local & Regime: [Cidade/Estado - Presencial/Híbrido/Remoto]
  🎯 Hard Skills (Obrigatórias): [Lista de tecnologias separadas por vírgula]
  ✨ Hard Skills (Desejáveis): [Lista de tecnologias separadas por vírgula]
  📝 Formação/Certificação: [Requisitos acadêmicos ou certificações]
  ⚙️ Atividades Principais:
  - [Atividade 1]
  - [Atividade 2]

  **IMPORTANTE:** Não adicione saudações, explicações ou qualquer texto fora desse formato.
" };

const ENRICHMENT_USER_CONTENT: &str = "Job Description:\n${JOB_DESCRIPTION}";

/// User message carrying the raw description of one posting.
pub fn prompt_enrich_job_description(raw_description: &str) -> Result<String, Error> {
    let res = substitute(ENRICHMENT_USER_CONTENT, &{
        let mut v = HashMap::new();
        v.insert("JOB_DESCRIPTION".to_string(), raw_description.to_string());
        v
    })?;
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_enrich_job_description() {
        let prompt = prompt_enrich_job_description("Vaga para Dev Rust\nRemoto").unwrap();
        assert_eq!(prompt, "Job Description:\nVaga para Dev Rust\nRemoto");
    }

    #[test]
    fn test_description_is_not_re_expanded() {
        // descriptions can contain shell-looking text; it must come through untouched
        let prompt = prompt_enrich_job_description("Salário: ${SALARIO} + $HOME").unwrap();
        assert_eq!(prompt, "Job Description:\nSalário: ${SALARIO} + $HOME");
    }

    #[test]
    fn test_system_prompt_lists_every_section() {
        for label in [
            "🏢 Cargo:",
            "📈 Nível:",
            "📍 Local & Regime:",
            "🎯 Hard Skills (Obrigatórias):",
            "✨ Hard Skills (Desejáveis):",
            "📝 Formação/Certificação:",
            "⚙️ Atividades Principais:",
        ] {
            assert!(ENRICHMENT_SYSTEM_PROMPT.contains(label), "missing {}", label);
        }
        assert!(ENRICHMENT_SYSTEM_PROMPT.starts_with("Você é um Engenheiro de Dados de Recrutamento"));
        assert!(ENRICHMENT_SYSTEM_PROMPT.trim_end().ends_with("fora desse formato."));
    }
}
