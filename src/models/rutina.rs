use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::ApiError;

/// Weekday an exercise is scheduled on. Stored as the `dia_semana`
/// Postgres enum; serialized with the accented Spanish day names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "dia_semana")]
pub enum DiaSemana {
    #[sqlx(rename = "Lunes")]
    Lunes,
    #[sqlx(rename = "Martes")]
    Martes,
    #[sqlx(rename = "Miércoles")]
    #[serde(rename = "Miércoles")]
    Miercoles,
    #[sqlx(rename = "Jueves")]
    Jueves,
    #[sqlx(rename = "Viernes")]
    Viernes,
    #[sqlx(rename = "Sábado")]
    #[serde(rename = "Sábado")]
    Sabado,
    #[sqlx(rename = "Domingo")]
    Domingo,
}

/// A routine row, without its exercises (the summary form).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Rutina {
    pub id: i32,
    pub nombre: String,
    pub descripcion: Option<String>,
    pub fecha_creacion: DateTime<Utc>,
}

/// An exercise row. `peso` is NULL for bodyweight exercises; `orden`
/// defines display order within a day.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Ejercicio {
    #[serde(skip_serializing, default)]
    pub rutina_id: i32,
    pub id: i32,
    pub nombre: String,
    pub dia_semana: DiaSemana,
    pub series: i32,
    pub repeticiones: i32,
    pub peso: Option<f64>,
    pub notas: Option<String>,
    pub orden: i32,
}

/// A routine with its exercises eagerly loaded (the detail form).
/// Every current endpoint responds with this shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RutinaDetail {
    pub id: i32,
    pub nombre: String,
    pub descripcion: Option<String>,
    pub fecha_creacion: DateTime<Utc>,
    pub ejercicios: Vec<Ejercicio>,
}

impl RutinaDetail {
    pub fn new(rutina: Rutina, ejercicios: Vec<Ejercicio>) -> Self {
        Self {
            id: rutina.id,
            nombre: rutina.nombre,
            descripcion: rutina.descripcion,
            fecha_creacion: rutina.fecha_creacion,
            ejercicios,
        }
    }
}

/// Exercise payload for create and for the replace-all set on update.
/// `orden` defaults to the exercise's position in the submitted array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEjercicio {
    pub nombre: String,
    pub dia_semana: DiaSemana,
    pub series: i32,
    pub repeticiones: i32,
    #[serde(default)]
    pub peso: Option<f64>,
    #[serde(default)]
    pub notas: Option<String>,
    #[serde(default)]
    pub orden: Option<i32>,
}

impl CreateEjercicio {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.nombre.trim().is_empty() {
            return Err(ApiError::Validation(
                "exercise name must not be empty".to_string(),
            ));
        }
        if self.nombre.trim().chars().count() > 255 {
            return Err(ApiError::Validation(
                "exercise name must be at most 255 characters".to_string(),
            ));
        }
        if self.series <= 0 {
            return Err(ApiError::Validation(
                "series must be greater than 0".to_string(),
            ));
        }
        if self.repeticiones <= 0 {
            return Err(ApiError::Validation(
                "repeticiones must be greater than 0".to_string(),
            ));
        }
        if let Some(peso) = self.peso {
            if peso <= 0.0 {
                return Err(ApiError::Validation(
                    "peso must be greater than 0 when present".to_string(),
                ));
            }
        }
        if let Some(orden) = self.orden {
            if orden < 0 {
                return Err(ApiError::Validation(
                    "orden must not be negative".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Request body for `POST /api/rutinas`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRutina {
    pub nombre: String,
    #[serde(default)]
    pub descripcion: Option<String>,
    #[serde(default)]
    pub ejercicios: Vec<CreateEjercicio>,
}

impl CreateRutina {
    pub fn validate(&self) -> Result<(), ApiError> {
        validate_rutina_nombre(&self.nombre)?;
        for ejercicio in &self.ejercicios {
            ejercicio.validate()?;
        }
        Ok(())
    }
}

/// Request body for `PUT /api/rutinas/{id}`. An omitted `ejercicios`
/// leaves the existing set untouched; a present array (even empty)
/// replaces it entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRutina {
    #[serde(default)]
    pub nombre: Option<String>,
    #[serde(default)]
    pub descripcion: Option<String>,
    #[serde(default)]
    pub ejercicios: Option<Vec<CreateEjercicio>>,
}

impl UpdateRutina {
    pub fn validate(&self) -> Result<(), ApiError> {
        if let Some(nombre) = &self.nombre {
            validate_rutina_nombre(nombre)?;
        }
        if let Some(ejercicios) = &self.ejercicios {
            for ejercicio in ejercicios {
                ejercicio.validate()?;
            }
        }
        Ok(())
    }
}

fn validate_rutina_nombre(nombre: &str) -> Result<(), ApiError> {
    let trimmed = nombre.trim();
    if trimmed.is_empty() {
        return Err(ApiError::Validation(
            "routine name must not be empty".to_string(),
        ));
    }
    // 255 characters, not bytes; accented names count per character.
    if trimmed.chars().count() > 255 {
        return Err(ApiError::Validation(
            "routine name must be at most 255 characters".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn press_banca() -> CreateEjercicio {
        CreateEjercicio {
            nombre: "Press de banca".to_string(),
            dia_semana: DiaSemana::Lunes,
            series: 4,
            repeticiones: 8,
            peso: Some(100.0),
            notas: None,
            orden: None,
        }
    }

    #[test]
    fn dia_semana_serializes_accented_names() {
        assert_eq!(
            serde_json::to_string(&DiaSemana::Miercoles).unwrap(),
            "\"Miércoles\""
        );
        assert_eq!(
            serde_json::to_string(&DiaSemana::Sabado).unwrap(),
            "\"Sábado\""
        );
        assert_eq!(serde_json::to_string(&DiaSemana::Lunes).unwrap(), "\"Lunes\"");
    }

    #[test]
    fn dia_semana_rejects_unknown_day() {
        assert!(serde_json::from_str::<DiaSemana>("\"Monday\"").is_err());
        assert!(serde_json::from_str::<DiaSemana>("\"lunes\"").is_err());
        assert_eq!(
            serde_json::from_str::<DiaSemana>("\"Domingo\"").unwrap(),
            DiaSemana::Domingo
        );
    }

    #[test]
    fn create_rutina_accepts_minimal_body() {
        let rutina: CreateRutina = serde_json::from_str(r#"{"nombre": "Pecho"}"#).unwrap();
        assert!(rutina.validate().is_ok());
        assert_eq!(rutina.descripcion, None);
        assert!(rutina.ejercicios.is_empty());
    }

    #[test]
    fn name_length_limit_counts_characters_not_bytes() {
        // 250 accented characters is 500 bytes but still within the limit.
        let rutina = CreateRutina {
            nombre: "á".repeat(250),
            descripcion: None,
            ejercicios: vec![],
        };
        assert!(rutina.validate().is_ok());

        let rutina = CreateRutina {
            nombre: "a".repeat(256),
            descripcion: None,
            ejercicios: vec![],
        };
        assert!(matches!(rutina.validate(), Err(ApiError::Validation(_))));

        let mut ejercicio = press_banca();
        ejercicio.nombre = "ñ".repeat(255);
        assert!(ejercicio.validate().is_ok());
        ejercicio.nombre = "ñ".repeat(256);
        assert!(ejercicio.validate().is_err());
    }

    #[test]
    fn create_rutina_rejects_blank_name() {
        let rutina = CreateRutina {
            nombre: "   ".to_string(),
            descripcion: None,
            ejercicios: vec![],
        };
        assert!(matches!(rutina.validate(), Err(ApiError::Validation(_))));
    }

    #[test]
    fn create_ejercicio_enforces_numeric_bounds() {
        let mut ejercicio = press_banca();
        assert!(ejercicio.validate().is_ok());

        ejercicio.series = 0;
        assert!(ejercicio.validate().is_err());

        ejercicio = press_banca();
        ejercicio.repeticiones = -1;
        assert!(ejercicio.validate().is_err());

        ejercicio = press_banca();
        ejercicio.peso = Some(0.0);
        assert!(ejercicio.validate().is_err());

        ejercicio = press_banca();
        ejercicio.peso = None;
        assert!(ejercicio.validate().is_ok());

        ejercicio = press_banca();
        ejercicio.orden = Some(-1);
        assert!(ejercicio.validate().is_err());
    }

    #[test]
    fn update_rutina_with_no_fields_is_valid() {
        let update: UpdateRutina = serde_json::from_str("{}").unwrap();
        assert!(update.validate().is_ok());
        assert!(update.ejercicios.is_none());
    }

    #[test]
    fn update_rutina_distinguishes_empty_and_omitted_ejercicios() {
        let omitted: UpdateRutina = serde_json::from_str(r#"{"nombre": "Piernas"}"#).unwrap();
        assert!(omitted.ejercicios.is_none());

        let empty: UpdateRutina = serde_json::from_str(r#"{"ejercicios": []}"#).unwrap();
        assert!(empty.validate().is_ok());
        assert!(empty.ejercicios.is_some_and(|e| e.is_empty()));
    }

    #[test]
    fn ejercicio_response_omits_rutina_id() {
        let ejercicio = Ejercicio {
            rutina_id: 7,
            id: 1,
            nombre: "Flexiones".to_string(),
            dia_semana: DiaSemana::Lunes,
            series: 3,
            repeticiones: 10,
            peso: None,
            notas: Some("Peso corporal".to_string()),
            orden: 1,
        };
        let value = serde_json::to_value(&ejercicio).unwrap();
        assert!(value.get("rutina_id").is_none());
        assert_eq!(value["orden"], 1);
        assert_eq!(value["peso"], serde_json::Value::Null);
    }
}
