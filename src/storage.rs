// src/storage.rs
//
// Armazenamento dos ficheiros justificativos: blobs opacos escritos em
// disco sob uploads/justificativos/{formando}/{aula}/, referenciados pelo
// caminho relativo guardado no registo de presença.
use crate::error::{AppError, AppResult};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Extensões aceites na fronteira (o conteúdo não é verificado).
const EXTENSOES_ACEITES: &[&str] = &["pdf", "png"];

/// Valida o nome do ficheiro e devolve a extensão em minúsculas.
fn extensao_aceite(nome_ficheiro: &str) -> AppResult<String> {
    let extensao = Path::new(nome_ficheiro)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .ok_or(AppError::JustificativoInvalido("sem extensão"))?;
    if !EXTENSOES_ACEITES.contains(&extensao.as_str()) {
        return Err(AppError::JustificativoInvalido("apenas PDF ou PNG"));
    }
    Ok(extensao)
}

/// Guarda um justificativo e devolve o caminho relativo a registar na DB.
/// O nome gravado é um UUID (o nome original pode conter o que calhar).
pub async fn guardar_justificativo(
    uploads_dir: &Path,
    formando_id: i64,
    aula_id: i64,
    nome_ficheiro: &str,
    conteudo: &[u8],
) -> AppResult<String> {
    let extensao = extensao_aceite(nome_ficheiro)?;
    if conteudo.is_empty() {
        return Err(AppError::JustificativoInvalido("ficheiro vazio"));
    }

    let relativo = format!(
        "justificativos/{}/{}/{}.{}",
        formando_id,
        aula_id,
        Uuid::new_v4(),
        extensao
    );
    let destino: PathBuf = uploads_dir.join(&relativo);
    if let Some(pai) = destino.parent() {
        tokio::fs::create_dir_all(pai).await?;
    }
    tokio::fs::write(&destino, conteudo).await?;

    tracing::info!(
        "Justificativo guardado para formando {} na aula {}: {}",
        formando_id,
        aula_id,
        relativo
    );
    Ok(relativo)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filtra_extensoes() {
        assert_eq!(extensao_aceite("declaracao.PDF").unwrap(), "pdf");
        assert_eq!(extensao_aceite("foto.png").unwrap(), "png");
        assert!(extensao_aceite("script.exe").is_err());
        assert!(extensao_aceite("sem_extensao").is_err());
    }

    #[tokio::test]
    async fn guarda_e_devolve_caminho_relativo() {
        let dir = std::env::temp_dir().join(format!("justificativos-teste-{}", Uuid::new_v4()));
        let caminho = guardar_justificativo(&dir, 7, 3, "atestado.pdf", b"%PDF-1.4")
            .await
            .unwrap();
        assert!(caminho.starts_with("justificativos/7/3/"));
        assert!(caminho.ends_with(".pdf"));
        assert!(dir.join(&caminho).exists());
        tokio::fs::remove_dir_all(&dir).await.ok();
    }

    #[tokio::test]
    async fn rejeita_ficheiro_vazio() {
        let dir = std::env::temp_dir();
        let erro = guardar_justificativo(&dir, 1, 1, "vazio.pdf", b"").await.unwrap_err();
        assert!(matches!(erro, AppError::JustificativoInvalido(_)));
    }
}
