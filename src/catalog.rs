//! ENEM subject catalog shown as cards on the landing page.

use serde::Serialize;

/// ENEM knowledge areas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Area {
    Linguagens,
    Humanas,
    Natureza,
    Matematica,
}

impl Area {
    pub const ALL: [Area; 4] = [
        Area::Linguagens,
        Area::Humanas,
        Area::Natureza,
        Area::Matematica,
    ];

    /// Official area name.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Linguagens => "Linguagens, Códigos e suas Tecnologias",
            Self::Humanas => "Ciências Humanas e suas Tecnologias",
            Self::Natureza => "Ciências da Natureza e suas Tecnologias",
            Self::Matematica => "Matemática e suas Tecnologias",
        }
    }

    /// Short slug used as a CSS modifier.
    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            Self::Linguagens => "linguagens",
            Self::Humanas => "humanas",
            Self::Natureza => "natureza",
            Self::Matematica => "matematica",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Subject {
    pub name: &'static str,
    pub description: &'static str,
    pub area: Area,
}

const fn subject(name: &'static str, description: &'static str, area: Area) -> Subject {
    Subject {
        name,
        description,
        area,
    }
}

/// All subjects, grouped by area in exam order.
pub const SUBJECTS: [Subject; 13] = [
    subject(
        "Língua Portuguesa",
        "Gramática, Literatura e Interpretação de Texto",
        Area::Linguagens,
    ),
    subject("Língua Estrangeira", "Inglês ou Espanhol", Area::Linguagens),
    subject(
        "Arte",
        "História da Arte e Movimentos Artísticos",
        Area::Linguagens,
    ),
    subject(
        "Educação Física",
        "Esportes e Atividades Físicas",
        Area::Linguagens,
    ),
    subject(
        "Tecnologias da Informação",
        "Informática e Redes Sociais",
        Area::Linguagens,
    ),
    subject("História", "História Geral e do Brasil", Area::Humanas),
    subject("Geografia", "Geografia Geral e do Brasil", Area::Humanas),
    subject(
        "Filosofia",
        "Filosofia Antiga e Contemporânea",
        Area::Humanas,
    ),
    subject("Sociologia", "Sociologia e Antropologia", Area::Humanas),
    subject("Biologia", "Biologia Celular e Evolução", Area::Natureza),
    subject(
        "Física",
        "Mecânica, Termologia e Eletricidade",
        Area::Natureza,
    ),
    subject("Química", "Química Geral e Orgânica", Area::Natureza),
    subject(
        "Matemática",
        "Álgebra, Geometria e Trigonometria",
        Area::Matematica,
    ),
];

/// Counts shown in the landing page hero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    pub subjects: usize,
    pub areas: usize,
}

#[must_use]
pub fn stats(subjects: &[Subject]) -> CatalogStats {
    let areas = Area::ALL
        .iter()
        .filter(|area| subjects.iter().any(|s| s.area == **area))
        .count();
    CatalogStats {
        subjects: subjects.len(),
        areas,
    }
}
