//! Rule tables per taxonomy and version.
//!
//! Row order is part of each taxonomy's meaning: keyword sets overlap and
//! the first matching row wins. Append new rows only where the intended
//! precedence holds.
use super::rules::{RuleSpec, TableSpec};

pub(crate) mod v1 {
    use super::{RuleSpec, TableSpec};

    pub(crate) const COMPANY: TableSpec = TableSpec {
        name: "categoria_empresa",
        unspecified: "otras",
        fallback: "otras",
        rules: &[
            RuleSpec::any("limpieza", &["CASALIMPIA", "ASEOS", "ECOLIMPIEZA", "NASE"]),
            RuleSpec::any(
                "seguridad",
                &["SECURITAS", "VISE", "SEGURIDAD NACIONAL", "LIBERTADORA"],
            ),
            RuleSpec::any(
                "servicios_temporales",
                &[
                    "MANPOWER",
                    "ADECCO",
                    "PRODUCTIVIDAD EMPRESARIAL",
                    "TEMPORAL",
                    "FLEXITEMP",
                ],
            ),
            RuleSpec::any("retail", &["D1", "ARA", "ALKOSTO", "EXITO"]),
            RuleSpec::any(
                "bpo_callcenter",
                &["ATENTO", "DICO", "TELEPERFORMANCE", "BRM", "MANEJO TECNICO"],
            ),
            RuleSpec::any(
                "manufactura_textil",
                &["HERMECO", "OFFCORSS", "PERMODA", "KOAJ"],
            ),
            RuleSpec::any(
                "manufactura_industrial",
                &["LADRILLERA", "PROTELA", "FORTOX"],
            ),
            RuleSpec::any("alimentos", &["FRISBY", "LISTOS", "QUALA", "GOYURT"]),
            RuleSpec::any(
                "transporte_logistica",
                &["CONSORCIO EXPRESS", "GMOVIL", "DITRANSA"],
            ),
            RuleSpec::any("salud", &["EMERMEDICA", "KERALTY", "AGM SALUD"]),
            RuleSpec::any("cobranza", &["RECUPERAR", "RECAUDO", "CARTERA"]),
            RuleSpec::any("construccion", &["CONSTRUCTORA", "CONSTRUCCION"]),
            RuleSpec::any(
                "servicios_especializados",
                &["THOMAS GREG", "OPTICENTRO", "SERDAN"],
            ),
            RuleSpec::any("ventas_comercial", &["INVERSIONES EL CARNAL", "CALZATODO"]),
            RuleSpec::any("colsubsidio", &["COLSUBSIDIO"]),
            RuleSpec::any("agropecuaria", &["AGROPECUARIA", "FLORICULTOR"]),
        ],
    };

    pub(crate) const JOB_TITLE: TableSpec = TableSpec {
        name: "categoria_cargo",
        unspecified: "otros",
        fallback: "otros",
        rules: &[
            RuleSpec::any(
                "limpieza_aseo",
                &["LIMPIEZA", "ASEO", "SERVICIOS GENERALES"],
            ),
            RuleSpec::any("seguridad", &["SEGURIDAD", "VIGILANTE"]),
            RuleSpec::any("bodega_logistica", &["BODEGA", "LOGISTIC", "ALMACEN"]),
            RuleSpec::any("produccion", &["PRODUCCION", "OPERARIO", "EMPAQUE"]),
            RuleSpec::any("ventas_comercial", &["COMERCIAL", "VENTAS", "ASESOR"]),
            RuleSpec::any("call_center", &["CALL CENTER", "CONTACT CENTER"]),
            RuleSpec::any("cocina_alimentos", &["COCINA", "COCINERO", "MESERO"]),
            RuleSpec::any(
                "conductor_transporte",
                &["CONDUCTOR", "MOTORIZADO", "DOMICILIARIO"],
            ),
            RuleSpec::any("tecnico", &["TECNICO", "ELECTRICISTA", "MECANICO"]),
            RuleSpec::any(
                "profesional_salud",
                &["MEDICO", "ODONTOLOGO", "ENFERMERA"],
            ),
            RuleSpec::any_except(
                "auxiliar_general",
                &["AUXILIAR"],
                &["BODEGA", "LOGISTIC", "PRODUCCION"],
            ),
            RuleSpec::any("cajero", &["CAJERO"]),
            RuleSpec::any("archivo_digitacion", &["ARCHIVO", "DIGITACION"]),
        ],
    };

    pub(crate) const REQUIREMENT: TableSpec = TableSpec {
        name: "categoria_requisito",
        unspecified: "sin_especificar",
        fallback: "otros",
        rules: &[
            RuleSpec::any("profesional", &["PROFESIONAL", "MEDICO", "INGENIERO"]),
            RuleSpec::any("tecnologo", &["TECNOLOGO"]),
            RuleSpec::any("tecnico", &["TECNICO", "CURSO", "VIGILANCIA"]),
            RuleSpec::any("bachiller", &["BACHILLER"]),
            RuleSpec::any("basica", &["PRIMARIA", "NOVENO"]),
            RuleSpec::any("sin_requisito", &["NO APLICA"]),
        ],
    };

    pub(crate) const DOCUMENTATION: TableSpec = TableSpec {
        name: "categoria_documentacion",
        unspecified: "sin_especificar",
        fallback: "otros",
        rules: &[
            RuleSpec::any("completa", &["ANTECEDENTES", "ADRES", "LIBRETA", "PENSION"]),
            RuleSpec::any("media", &["HOJA", "VIDA", "CEDULA", "CERTIFICADO"]),
            RuleSpec::any("basica", &["DOCUMENTO"]),
        ],
    };
}

pub(crate) mod v2 {
    use super::{RuleSpec, TableSpec};

    pub(crate) const COMPANY: TableSpec = TableSpec {
        name: "categoria_empresa",
        unspecified: "otras",
        fallback: "otras",
        rules: &[
            RuleSpec::any(
                "limpieza",
                &[
                    "CASALIMPIA",
                    "ASEOS",
                    "PROLIMZA",
                    "ECOLIMPIEZA",
                    "NASE",
                    "EXPERIENZA",
                    "CASA LIMPIA",
                    "ADMIASEO",
                ],
            ),
            RuleSpec::any(
                "seguridad",
                &[
                    "SECURITAS",
                    "VISE",
                    "SEGURIDAD NACIONAL",
                    "LIBERTADORA",
                    "PROSEGUR",
                    "COLVISEG",
                    "HONOR",
                    "TRANSBANK",
                ],
            ),
            RuleSpec::any(
                "servicios_temporales",
                &[
                    "MANPOWER",
                    "ADECCO",
                    "PRODUCTIVIDAD EMPRESARIAL",
                    "TEMPORAL",
                    "SOLUCIONES LABORALES",
                    "GOLD RH",
                    "FLEXITEMP",
                    "ACTIVOS",
                    "MULTIEMPLEOS",
                    "COMPLEMENTOS HUMANOS",
                    "ELITE",
                    "INTEGRITY",
                    "JOB AND TALENT",
                    "JOBANDTALENT",
                ],
            ),
            RuleSpec::any(
                "retail",
                &["D1", "ARA", "JERONIMO MARTINS", "ALKOSTO", "EXITO", "MINISO"],
            ),
            RuleSpec::any(
                "bpo_callcenter",
                &[
                    "ATENTO",
                    "DICO",
                    "TELEPERFORMANCE",
                    "ATECH BPO",
                    "IMAGE QUALITY",
                    "BRM",
                    "MANEJO TECNICO",
                ],
            ),
            RuleSpec::any(
                "manufactura_textil",
                &[
                    "HERMECO",
                    "OFFCORSS",
                    "AJOVER",
                    "DARNEL",
                    "CASA LUKER",
                    "PERMODA",
                    "KOAJ",
                    "MODANOVA",
                    "MANUFACTURAS ELIOT",
                ],
            ),
            RuleSpec::any(
                "manufactura_industrial",
                &[
                    "LADRILLERA",
                    "PROTELA",
                    "FORTOX",
                    "COLOMBIANA DE PINTURAS",
                    "FERROALUMINIOS",
                    "FLEXO SPRING",
                    "ESTIBAS",
                ],
            ),
            RuleSpec::any(
                "alimentos",
                &[
                    "FRISBY",
                    "HORNITOS",
                    "LISTOS",
                    "QUALA",
                    "GOYURT",
                    "TABASCO",
                    "GATE GOURMET",
                    "GATEGOURMET",
                ],
            ),
            RuleSpec::any(
                "transporte_logistica",
                &[
                    "CONSORCIO EXPRESS",
                    "GMOVIL",
                    "DITRANSA",
                    "COTRANSCOPETROL",
                    "ANAVA TRANSPORT",
                    "DISTRIBUCIONES AXA",
                    "MEGALINEA",
                ],
            ),
            RuleSpec::any(
                "salud",
                &["EMERMEDICA", "KERALTY", "AGM SALUD", "GLOBAL LIFE"],
            ),
            RuleSpec::any(
                "cobranza",
                &["RECUPERAR", "RECAUDO", "CONSULTORA", "CARTERA"],
            ),
            RuleSpec::any(
                "construccion",
                &["CONSTRUCTORA", "CONSTRUELECTRICOS", "CONSTRUCCION"],
            ),
            RuleSpec::any(
                "servicios_especializados",
                &[
                    "THOMAS GREG",
                    "TAESCOL",
                    "OPTICENTRO",
                    "SERDAN",
                    "RECORDAR",
                    "PREVISION EXEQUIAL",
                    "FUMIGACION",
                    "QUALITY CARWASH",
                    "SIMONIZ",
                ],
            ),
            RuleSpec::any(
                "ventas_comercial",
                &[
                    "INVERSIONES EL CARNAL",
                    "VENTAS Y SERVICIOS",
                    "CALZATODO",
                    "KARROMANIA",
                ],
            ),
            RuleSpec::any("colsubsidio", &["COLSUBSIDIO"]),
            RuleSpec::any(
                "agropecuaria",
                &["AGROPECUARIA", "FLORICULTOR", "AVICOLA"],
            ),
        ],
    };

    pub(crate) const JOB_TITLE: TableSpec = TableSpec {
        name: "categoria_cargo",
        unspecified: "otros",
        fallback: "otros",
        rules: &[
            RuleSpec::any(
                "limpieza_aseo",
                &["LIMPIEZA", "ASEO", "SERVICIOS GENERALES", "DESINFECCION"],
            ),
            RuleSpec::any("seguridad", &["SEGURIDAD", "VIGILANTE", "GUARDA"]),
            RuleSpec::any("bodega_logistica", &["BODEGA", "LOGISTIC", "ALMACEN"]),
            RuleSpec::any(
                "produccion",
                &["PRODUCCION", "OPERARIO", "EMPAQUE", "MANUFACTUR"],
            ),
            RuleSpec::any(
                "ventas_comercial",
                &["COMERCIAL", "VENTAS", "ASESOR", "EJECUTIVO", "IMPULSA"],
            ),
            RuleSpec::any(
                "call_center",
                &["CALL CENTER", "CONTACT CENTER", "TELEMARKETING"],
            ),
            RuleSpec::any(
                "cocina_alimentos",
                &["COCINA", "COCINERO", "MESERO", "PANADERO"],
            ),
            RuleSpec::any(
                "conductor_transporte",
                &["CONDUCTOR", "MOTORIZADO", "DOMICILIARIO", "TRANSPORTA"],
            ),
            RuleSpec::any(
                "tecnico",
                &["TECNICO", "ELECTRICISTA", "MECANICO", "MANTENIMIENTO"],
            ),
            RuleSpec::any(
                "profesional_salud",
                &["MEDICO", "ODONTOLOGO", "ENFERMERA", "TERAPEUTA", "OPTOMETRA"],
            ),
            RuleSpec::any_except(
                "auxiliar_general",
                &["AUXILIAR"],
                &["BODEGA", "LOGISTIC", "PRODUCCION", "LIMPIEZA"],
            ),
            RuleSpec::any("cajero", &["CAJERO"]),
            RuleSpec::any("archivo_digitacion", &["ARCHIVO", "DIGITACION"]),
        ],
    };

    pub(crate) const REQUIREMENT: TableSpec = TableSpec {
        name: "categoria_requisito",
        unspecified: "sin_especificar",
        fallback: "otros",
        rules: &[
            RuleSpec::any(
                "profesional",
                &[
                    "PROFESIONAL",
                    "LICENCIATURA",
                    "MEDICO",
                    "ODONTOLOGO",
                    "ARQUITECTO",
                    "INGENIERO",
                ],
            ),
            RuleSpec::any("tecnologo", &["TECNOLOGO"]),
            RuleSpec::any("tecnico", &["TECNICO", "CURSO", "VIGILANCIA", "RETHUS"]),
            RuleSpec::any("bachiller", &["BACHILLER"]),
            RuleSpec::any("basica", &["PRIMARIA", "LECTO", "NOVENO", "9"]),
            RuleSpec::any("sin_requisito", &["NO APLICA", "SIN EXPERIENCIA"]),
        ],
    };

    pub(crate) const DOCUMENTATION: TableSpec = TableSpec {
        name: "categoria_documentacion",
        unspecified: "sin_especificar",
        fallback: "otros",
        rules: &[
            RuleSpec::any(
                "completa",
                &["ANTECEDENTES", "ADRES", "LIBRETA", "PENSION", "CURSO"],
            ),
            RuleSpec::any(
                "media",
                &["HOJA", "VIDA", "CEDULA", "CERTIFICADO", "SOPORTE"],
            ),
            // HOJA, VIDA and CEDULA are shadowed by `media`; kept for parity
            // with the fitted encoding.
            RuleSpec::any("basica", &["HOJA", "VIDA", "CEDULA", "DOCUMENTO"]),
        ],
    };
}

/// The interview time-slot table is identical in every version. A `-`
/// inside a non-placeholder value marks a range of slots.
pub(crate) const INTERVIEW_SLOT: TableSpec = TableSpec {
    name: "franja_hora_entrevista",
    unspecified: "sin_hora",
    fallback: "sin_hora",
    rules: &[
        RuleSpec::any("multiple", &["-"]),
        RuleSpec::any("manana", &["07:", "08:", "09:", "10:", "11:", "AM"]),
        RuleSpec::any("tarde", &["12:", "01:", "02:", "03:", "04:", "05:", "PM"]),
    ],
};
