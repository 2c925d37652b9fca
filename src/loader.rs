use crate::error::LoadError;
use crate::store::Snapshot;
use crate::types::{
    Affiliate, Cooperative, Credit, CreditType, Department, DepositType, Deposit, Director,
    Employee, Genero, Municipality, Officer, OrganType, RawAffiliateRow, RawCatalogRow,
    RawCooperativeRow, RawCreditRow, RawDepositRow, RawDirectorRow, RawEmployeeRow,
    RawMunicipalityRow, RawOfficerRow, RawRemittanceRow, Remittance,
};
use crate::util::{parse_f64_safe, parse_i64_safe, parse_text};
use csv::{ReaderBuilder, Trim};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Where the two groups of CSV files live.
#[derive(Debug, Clone)]
pub struct DataPaths {
    pub catalogs: PathBuf,
    pub records: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub file: String,
    pub rows: usize,
    pub skipped: usize,
    /// Source line of each skipped row, header included in the count.
    pub skipped_lines: Vec<u64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadReport {
    pub files: Vec<FileReport>,
}

impl LoadReport {
    pub fn total_rows(&self) -> usize {
        self.files.iter().map(|f| f.rows).sum()
    }

    pub fn skipped_rows(&self) -> usize {
        self.files.iter().map(|f| f.skipped).sum()
    }

    pub fn loaded_rows(&self) -> usize {
        self.total_rows() - self.skipped_rows()
    }
}

/// Load every dataset into a fresh snapshot.
///
/// A file that cannot be opened or read aborts the whole load and nothing is
/// returned. Rows that fail to parse are logged, counted and skipped.
pub fn load_snapshot(paths: &DataPaths) -> Result<(Snapshot, LoadReport), LoadError> {
    let mut report = LoadReport::default();
    let cat = |name: &str| paths.catalogs.join(name);
    let rec = |name: &str| paths.records.join(name);

    info!(
        catalogs = %paths.catalogs.display(),
        records = %paths.records.display(),
        "loading datasets"
    );

    let snapshot = Snapshot {
        departments: load_dataset(&cat("departamentos.csv"), clean_department, &mut report)?,
        municipalities: load_dataset(&cat("municipios.csv"), clean_municipality, &mut report)?,
        cooperatives: load_dataset(&cat("cooperativas.csv"), clean_cooperative, &mut report)?,
        credit_types: load_dataset(&cat("tipos_credito.csv"), clean_credit_type, &mut report)?,
        deposit_types: load_dataset(&cat("tipos_deposito.csv"), clean_deposit_type, &mut report)?,
        credits: load_dataset(&rec("creditos.csv"), clean_credit, &mut report)?,
        deposits: load_dataset(&rec("depositos.csv"), clean_deposit, &mut report)?,
        remittances: load_dataset(&rec("remesas.csv"), clean_remittance, &mut report)?,
        affiliates: load_dataset(&rec("afiliados.csv"), clean_affiliate, &mut report)?,
        directors: load_dataset(&rec("directivos.csv"), clean_director, &mut report)?,
        employees: load_dataset(&rec("empleados.csv"), clean_employee, &mut report)?,
        officers: load_dataset(&rec("funcionarios.csv"), clean_officer, &mut report)?,
    };

    info!(
        rows = report.total_rows(),
        skipped = report.skipped_rows(),
        "all datasets loaded"
    );
    Ok((snapshot, report))
}

fn load_dataset<R, T, F>(
    path: &Path,
    clean: F,
    report: &mut LoadReport,
) -> Result<Vec<T>, LoadError>
where
    R: DeserializeOwned,
    F: Fn(R) -> Option<T>,
{
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(file);
    let csv_error = |source: csv::Error| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let headers = rdr.headers().map_err(csv_error)?.clone();

    let mut rows = 0usize;
    let mut skipped_lines = Vec::new();
    let mut out = Vec::new();
    for result in rdr.records() {
        rows += 1;
        let record = match result {
            Ok(r) => r,
            Err(e) if e.is_io_error() => return Err(csv_error(e)),
            Err(e) => {
                let line = e.position().map(|p| p.line());
                warn!(file = %path.display(), line, error = %e, "skipping unreadable row");
                skipped_lines.push(line.unwrap_or_default());
                continue;
            }
        };
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let raw: R = match record.deserialize(Some(&headers)) {
            Ok(r) => r,
            Err(e) => {
                warn!(file = %path.display(), line, error = %e, "skipping unparsable row");
                skipped_lines.push(line);
                continue;
            }
        };
        match clean(raw) {
            Some(record) => out.push(record),
            None => {
                warn!(file = %path.display(), line, "skipping row without a valid id");
                skipped_lines.push(line);
            }
        }
    }

    let skipped = skipped_lines.len();
    debug!(file = %path.display(), rows, skipped, "dataset loaded");
    report.files.push(FileReport {
        file: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string()),
        rows,
        skipped,
        skipped_lines,
    });
    Ok(out)
}

fn clean_department(row: RawCatalogRow) -> Option<Department> {
    Some(Department {
        id: parse_i64_safe(row.id.as_deref())?,
        nombre: parse_text(row.nombre.as_deref()).unwrap_or_default(),
    })
}

fn clean_municipality(row: RawMunicipalityRow) -> Option<Municipality> {
    Some(Municipality {
        id: parse_i64_safe(row.id.as_deref())?,
        nombre: parse_text(row.nombre.as_deref()).unwrap_or_default(),
        departamento_id: parse_i64_safe(row.departamento_id.as_deref()),
    })
}

fn clean_cooperative(row: RawCooperativeRow) -> Option<Cooperative> {
    Some(Cooperative {
        estado: parse_text(row.estado.as_deref()).unwrap_or_default(),
    })
}

fn clean_credit_type(row: RawCatalogRow) -> Option<CreditType> {
    Some(CreditType {
        id: parse_i64_safe(row.id.as_deref())?,
        nombre: parse_text(row.nombre.as_deref()).unwrap_or_default(),
    })
}

fn clean_deposit_type(row: RawCatalogRow) -> Option<DepositType> {
    Some(DepositType {
        id: parse_i64_safe(row.id.as_deref())?,
        nombre: parse_text(row.nombre.as_deref()).unwrap_or_default(),
    })
}

fn clean_credit(row: RawCreditRow) -> Option<Credit> {
    Some(Credit {
        genero: Genero::from_code(row.genero.as_deref()),
        saldo_actual: parse_f64_safe(row.saldo_actual.as_deref()).unwrap_or(0.0),
        monto: parse_f64_safe(row.monto.as_deref()).unwrap_or(0.0),
        tipo_credito_id: parse_i64_safe(row.tipo_credito_id.as_deref()),
        departamento_id: parse_i64_safe(row.departamento_id.as_deref()),
        edad: parse_i64_safe(row.edad.as_deref()),
    })
}

fn clean_deposit(row: RawDepositRow) -> Option<Deposit> {
    Some(Deposit {
        saldo: parse_f64_safe(row.saldo.as_deref()).unwrap_or(0.0),
    })
}

fn clean_remittance(row: RawRemittanceRow) -> Option<Remittance> {
    Some(Remittance {
        monto_usd: parse_f64_safe(row.monto_usd.as_deref()).unwrap_or(0.0),
    })
}

fn clean_affiliate(row: RawAffiliateRow) -> Option<Affiliate> {
    Some(Affiliate {
        estado: parse_text(row.estado.as_deref()).unwrap_or_default(),
        genero: Genero::from_code(row.genero.as_deref()),
        departamento_id: parse_i64_safe(row.departamento_id.as_deref()),
    })
}

fn clean_director(row: RawDirectorRow) -> Option<Director> {
    Some(Director {
        genero: Genero::from_code(row.genero.as_deref()),
        tipo_organo: OrganType::from_name(row.tipo_organo.as_deref()),
    })
}

fn clean_employee(row: RawEmployeeRow) -> Option<Employee> {
    Some(Employee {
        genero: Genero::from_code(row.genero.as_deref()),
        estado: parse_text(row.estado.as_deref()).unwrap_or_default(),
    })
}

fn clean_officer(row: RawOfficerRow) -> Option<Officer> {
    Some(Officer {
        genero: Genero::from_code(row.genero.as_deref()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, body: &str) {
        fs::write(dir.join(name), body).unwrap();
    }

    /// A complete, minimal data tree; tests overwrite single files.
    fn fixture() -> (TempDir, DataPaths) {
        let tmp = TempDir::new().unwrap();
        let catalogs = tmp.path().join("catalogos");
        let records = tmp.path().join("datos");
        fs::create_dir_all(&catalogs).unwrap();
        fs::create_dir_all(&records).unwrap();

        write(&catalogs, "departamentos.csv", "id,nombre\n1,Atlántida\n8,Francisco Morazán\n");
        write(&catalogs, "municipios.csv", "id,nombre,departamento_id\n101,La Ceiba,1\n");
        write(
            &catalogs,
            "cooperativas.csv",
            "id,nombre,estado\n1,Coop A,ACTIVA\n2,Coop B,INACTIVA\n",
        );
        write(&catalogs, "tipos_credito.csv", "id,nombre\n1,Consumo\n2,Vivienda\n");
        write(&catalogs, "tipos_deposito.csv", "id,nombre\n1,Ahorro\n");
        write(
            &records,
            "creditos.csv",
            "genero,saldo_actual,monto,tipo_credito_id,departamento_id,edad\n\
             H,1000000,2000000,1,8,30\n\
             M,,500000,2,1,\n\
             \n\
             J,\"1,500\",0,1,8,40\n",
        );
        write(&records, "depositos.csv", "saldo\n100\n\n250.5\n");
        write(&records, "remesas.csv", "monto_usd\n1000\n");
        write(
            &records,
            "afiliados.csv",
            "estado,genero,departamento_id\nACTIVO,H,1\nACTIVO,M,8\nINACTIVO,M,8\n",
        );
        write(
            &records,
            "directivos.csv",
            "genero,tipo_organo\nH,Junta Directiva\nM,Junta de Vigilancia\n",
        );
        write(&records, "empleados.csv", "genero,estado\nM,ACTIVO\n");
        write(&records, "funcionarios.csv", "genero\nH\n");

        let paths = DataPaths { catalogs, records };
        (tmp, paths)
    }

    #[test]
    fn loads_every_dataset() {
        let (_tmp, paths) = fixture();
        let (snapshot, report) = load_snapshot(&paths).unwrap();

        assert_eq!(snapshot.departments.len(), 2);
        assert_eq!(snapshot.municipalities.len(), 1);
        assert_eq!(snapshot.cooperatives.len(), 2);
        assert_eq!(snapshot.credit_types.len(), 2);
        assert_eq!(snapshot.deposit_types.len(), 1);
        assert_eq!(snapshot.credits.len(), 3);
        assert_eq!(snapshot.deposits.len(), 2);
        assert_eq!(snapshot.remittances.len(), 1);
        assert_eq!(snapshot.affiliates.len(), 3);
        assert_eq!(snapshot.directors.len(), 2);
        assert_eq!(snapshot.employees.len(), 1);
        assert_eq!(snapshot.officers.len(), 1);
        assert_eq!(report.files.len(), 12);
        assert_eq!(report.skipped_rows(), 0);
        assert_eq!(report.total_rows(), snapshot.total_records());
    }

    #[test]
    fn missing_numbers_become_zero_and_types_are_inferred() {
        let (_tmp, paths) = fixture();
        let (snapshot, _) = load_snapshot(&paths).unwrap();

        let first = &snapshot.credits[0];
        assert_eq!(first.genero, Genero::Male);
        assert_eq!(first.saldo_actual, 1_000_000.0);
        assert_eq!(first.tipo_credito_id, Some(1));
        assert_eq!(first.edad, Some(30));

        let second = &snapshot.credits[1];
        assert_eq!(second.saldo_actual, 0.0);
        assert_eq!(second.edad, None);

        assert_eq!(snapshot.credits[2].saldo_actual, 1_500.0);
        assert_eq!(snapshot.deposits[1].saldo, 250.5);
        assert_eq!(snapshot.directors[1].tipo_organo, OrganType::JuntaVigilancia);
    }

    #[test]
    fn catalog_rows_without_id_are_skipped_and_counted() {
        let (_tmp, paths) = fixture();
        write(
            &paths.catalogs,
            "departamentos.csv",
            "id,nombre\n1,Atlántida\n,Sin id\nabc,Texto\n",
        );
        let (snapshot, report) = load_snapshot(&paths).unwrap();

        assert_eq!(snapshot.departments.len(), 1);
        let depts = report.files.iter().find(|f| f.file == "departamentos.csv").unwrap();
        assert_eq!(depts.rows, 3);
        assert_eq!(depts.skipped, 2);
        assert_eq!(depts.skipped_lines, [3, 4]);
        assert_eq!(report.loaded_rows(), report.total_rows() - 2);
    }

    #[test]
    fn undecodable_rows_are_skipped_and_the_load_continues() {
        let (_tmp, paths) = fixture();
        let mut body = b"estado,genero,departamento_id\nACTIVO,H,1\n\nACTIVO,".to_vec();
        body.extend_from_slice(&[0xff, 0xfe]);
        body.extend_from_slice(b",8\nACTIVO,M,8\n");
        fs::write(paths.records.join("afiliados.csv"), body).unwrap();

        let (snapshot, report) = load_snapshot(&paths).unwrap();
        assert_eq!(snapshot.affiliates.len(), 2);
        assert_eq!(snapshot.affiliates[0].genero, Genero::Male);
        assert_eq!(snapshot.affiliates[1].genero, Genero::Female);

        let afiliados = report.files.iter().find(|f| f.file == "afiliados.csv").unwrap();
        assert_eq!(afiliados.rows, 3);
        assert_eq!(afiliados.skipped, 1);
    }

    #[test]
    fn skipped_lines_follow_the_file_not_the_record_count() {
        let (_tmp, paths) = fixture();
        // A quoted name spanning two lines and a blank line push the bad
        // row down to line 6.
        write(
            &paths.catalogs,
            "tipos_credito.csv",
            "id,nombre\n1,\"Consumo\npersonal\"\n\n2,Vivienda\n,Sin id\n",
        );
        let (snapshot, report) = load_snapshot(&paths).unwrap();

        assert_eq!(snapshot.credit_types.len(), 2);
        assert_eq!(snapshot.credit_types[0].nombre, "Consumo\npersonal");
        let tipos = report.files.iter().find(|f| f.file == "tipos_credito.csv").unwrap();
        assert_eq!(tipos.skipped_lines, [6]);
    }

    #[test]
    fn fractional_ages_are_not_ages() {
        let (_tmp, paths) = fixture();
        write(
            &paths.records,
            "creditos.csv",
            "genero,saldo_actual,monto,tipo_credito_id,departamento_id,edad\n\
             H,100,100,1,8,30.5\n\
             M,100,100,1,8,31.0\n",
        );
        let (snapshot, _) = load_snapshot(&paths).unwrap();
        assert_eq!(snapshot.credits[0].edad, None);
        assert_eq!(snapshot.credits[1].edad, Some(31));
    }

    #[test]
    fn unknown_gender_codes_are_kept_as_unknown() {
        let (_tmp, paths) = fixture();
        write(&paths.records, "funcionarios.csv", "genero\nX\n\nH\n");
        let (snapshot, _) = load_snapshot(&paths).unwrap();
        assert_eq!(snapshot.officers.len(), 2);
        assert_eq!(snapshot.officers[0].genero, Genero::Unknown);
    }

    #[test]
    fn missing_file_fails_the_whole_load() {
        let (_tmp, paths) = fixture();
        fs::remove_file(paths.records.join("remesas.csv")).unwrap();

        match load_snapshot(&paths) {
            Err(LoadError::Io { path, .. }) => assert!(path.ends_with("remesas.csv")),
            other => panic!("expected an I/O error, got {:?}", other.map(|(_, r)| r)),
        }
    }
}
