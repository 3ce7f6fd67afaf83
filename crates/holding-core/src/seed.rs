use crate::error::Result;
use crate::phases::integralization::AssetKind;
use crate::project::{self, Actor, Project};
use crate::types::{ClientType, DocumentCategory, MaritalStatus, Role};
use crate::user::{QualificationData, User, UserDocument};
use std::path::Path;

// ---------------------------------------------------------------------------
// Demo data
// ---------------------------------------------------------------------------

/// What `holding seed` planted, so callers can print the credentials.
#[derive(Debug)]
pub struct SeedSummary {
    pub admin_email: String,
    pub consultant_email: String,
    pub client_email: String,
    pub project_id: String,
}

/// Plant a demo office: one user per role, a fully qualified partner client
/// with the canonical `joao.completo@email.com` / `123` login, and one
/// engagement underway. Intended for fresh workspaces; existing emails make
/// this fail rather than duplicate.
pub fn plant(root: &Path) -> Result<SeedSummary> {
    let admin = User::new("Marta Ribeiro", "admin@escritorio.com", Role::Administrator, "admin")?;
    let consultant = User::new("Caio Mendes", "caio@escritorio.com", Role::Consultant, "caio")?;
    let mut auxiliary = User::new("Duda Farias", "duda@escritorio.com", Role::Auxiliary, "duda")?;
    auxiliary.assign_provisional_password();

    let mut joao = User::new("João Completo", "joao.completo@email.com", Role::Client, "123")?;
    joao.set_client_type(ClientType::Partner);
    joao.set_qualification(QualificationData {
        cpf: "987.654.321-00".to_string(),
        rg: "SP-44.555.666".to_string(),
        marital_status: Some(MaritalStatus::Casado),
        property_regime: Some("comunhão parcial de bens".to_string()),
        birth_date: "1972-03-18".to_string(),
        nationality: "brasileira".to_string(),
        profession: "empresário".to_string(),
        address: "Alameda dos Ipês 42, São Paulo".to_string(),
        declares_income_tax: true,
    });
    joao.add_document(UserDocument::new("RG João", DocumentCategory::Identity, "seed/joao-rg.pdf"));
    joao.add_document(UserDocument::new(
        "Comprovante de endereço",
        DocumentCategory::Address,
        "seed/joao-endereco.pdf",
    ));
    joao.add_document(UserDocument::new(
        "Certidão de casamento",
        DocumentCategory::MarriageCertificate,
        "seed/joao-casamento.pdf",
    ));
    joao.add_document(UserDocument::new(
        "IRPF 2025",
        DocumentCategory::TaxReturn,
        "seed/joao-irpf.pdf",
    ));

    let mut helena = User::new("Helena Completo", "helena@email.com", Role::Client, "x")?;
    helena.set_client_type(ClientType::Interested);
    helena.assign_provisional_password();

    let admin = User::create(root, admin)?;
    let consultant = User::create(root, consultant)?;
    let auxiliary = User::create(root, auxiliary)?;
    let joao = User::create(root, joao)?;
    let helena = User::create(root, helena)?;

    let mut demo = Project::new(
        "Holding Família Completo",
        consultant.id.clone(),
        vec![joao.id.clone(), helena.id.clone()],
    );
    demo.auxiliary_id = Some(auxiliary.id.clone());

    let caio = Actor::from_user(&consultant);
    demo.log(&caio, "criou o projeto");

    // a bit of real progress so the demo is not an empty shell
    {
        let diag = demo.phase_mut(1)?.diagnostic_mut()?;
        diag.complete_step(1, true, true)?;
        diag.complete_step(2, true, true)?;
    }
    demo.advance_phase(1, &caio)?;
    {
        let data = demo.phase_mut(3)?.integralization_mut()?;
        data.add_asset(
            "Apartamento Alameda dos Ipês 42",
            AssetKind::RealEstate,
            Some("R$ 850.000".to_string()),
            Some("Matrícula 112.334".to_string()),
        )?;
    }
    let ana = Actor::from_user(&joao);
    demo.post_client_message(&ana, "Bom dia! Enviei meus documentos, podem conferir?")?;
    demo.post_internal_message(&caio, "Qualificação do João conferida, seguimos para a fase 2.")?;

    project::save(root, &demo)?;

    Ok(SeedSummary {
        admin_email: admin.email,
        consultant_email: consultant.email,
        client_email: joao.email,
        project_id: demo.id,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn seed_plants_users_and_a_project() {
        let dir = TempDir::new().unwrap();
        let summary = plant(dir.path()).unwrap();

        let users = User::list(dir.path()).unwrap();
        assert_eq!(users.len(), 5);

        let projects = project::list(dir.path()).unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].id, summary.project_id);
        assert_eq!(projects[0].current_phase, 2);
        assert_eq!(projects[0].client_ids.len(), 2);
    }

    #[test]
    fn seeded_partner_logs_in_and_is_data_complete() {
        let dir = TempDir::new().unwrap();
        plant(dir.path()).unwrap();

        let joao = User::find_by_email(dir.path(), "joao.completo@email.com")
            .unwrap()
            .expect("seed client exists");
        assert_eq!(joao.role, Role::Client);
        assert_eq!(joao.client_type, Some(ClientType::Partner));
        assert!(joao.verify_password("123"));
        assert_eq!(joao.documents.len(), 4);
        assert!(joao.is_data_complete());
    }

    #[test]
    fn seed_refuses_to_run_twice() {
        let dir = TempDir::new().unwrap();
        plant(dir.path()).unwrap();
        assert!(plant(dir.path()).is_err());
    }
}
