use serde_json::{Value, json};

/// Regional sales grouped by region with subtotals, a grand total and a
/// "Page X of Y" footer.
pub const SALES_REPORT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<jasperReport xmlns="http://jasperreports.sourceforge.net/jasperreports"
              name="Sales" pageWidth="595" pageHeight="842" columnWidth="555"
              leftMargin="20" rightMargin="20" topMargin="20" bottomMargin="20">
  <parameter name="ReportTitle" class="java.lang.String">
    <defaultValueExpression><![CDATA["Quarterly sales"]]></defaultValueExpression>
  </parameter>
  <queryString><![CDATA[SELECT region, product, amount FROM sales]]></queryString>
  <field name="region" class="java.lang.String"/>
  <field name="product" class="java.lang.String"/>
  <field name="amount" class="java.math.BigDecimal"/>
  <sortField name="region"/>
  <variable name="RegionTotal" class="java.math.BigDecimal" calculation="Sum" resetType="Group" resetGroup="Region">
    <variableExpression><![CDATA[$F{amount}]]></variableExpression>
  </variable>
  <variable name="GrandTotal" class="java.math.BigDecimal" calculation="Sum">
    <variableExpression><![CDATA[$F{amount}]]></variableExpression>
  </variable>
  <group name="Region">
    <groupExpression><![CDATA[$F{region}]]></groupExpression>
    <groupHeader>
      <band height="20">
        <textField>
          <reportElement x="0" y="0" width="300" height="20"/>
          <textElement><font isBold="true"/></textElement>
          <textFieldExpression><![CDATA["Region: " + $F{region}]]></textFieldExpression>
        </textField>
      </band>
    </groupHeader>
    <groupFooter>
      <band height="20">
        <textField pattern="currency">
          <reportElement x="300" y="0" width="255" height="20"/>
          <textElement textAlignment="Right"/>
          <textFieldExpression><![CDATA[$V{RegionTotal}]]></textFieldExpression>
        </textField>
      </band>
    </groupFooter>
  </group>
  <title>
    <band height="40">
      <textField>
        <reportElement x="0" y="0" width="555" height="30"/>
        <textElement textAlignment="Center"><font size="18" isBold="true"/></textElement>
        <textFieldExpression><![CDATA[$P{ReportTitle}]]></textFieldExpression>
      </textField>
    </band>
  </title>
  <columnHeader>
    <band height="20">
      <staticText>
        <reportElement x="0" y="0" width="300" height="20"/>
        <text><![CDATA[Product]]></text>
      </staticText>
      <staticText>
        <reportElement x="300" y="0" width="255" height="20"/>
        <textElement textAlignment="Right"/>
        <text><![CDATA[Amount]]></text>
      </staticText>
    </band>
  </columnHeader>
  <detail>
    <band height="20">
      <textField>
        <reportElement x="0" y="0" width="300" height="20"/>
        <textFieldExpression><![CDATA[$F{product}]]></textFieldExpression>
      </textField>
      <textField pattern="number:2">
        <reportElement x="300" y="0" width="255" height="20"/>
        <textElement textAlignment="Right"/>
        <textFieldExpression><![CDATA[$F{amount}]]></textFieldExpression>
      </textField>
    </band>
  </detail>
  <pageFooter>
    <band height="20">
      <textField>
        <reportElement x="0" y="0" width="555" height="20"/>
        <textElement textAlignment="Center"/>
        <textFieldExpression><![CDATA["Page " + $V{PAGE_NUMBER} + " of " + $V{PAGE_COUNT}]]></textFieldExpression>
      </textField>
    </band>
  </pageFooter>
  <summary>
    <band height="30">
      <textField pattern="currency">
        <reportElement x="300" y="5" width="255" height="20"/>
        <textElement textAlignment="Right"><font isBold="true"/></textElement>
        <textFieldExpression><![CDATA[$V{GrandTotal}]]></textFieldExpression>
      </textField>
    </band>
  </summary>
</jasperReport>
"#;

/// A 200pt square page with 10pt margins: eight 20pt detail rows fit per page.
pub const PAGED_REPORT: &str = r#"<jasperReport name="Paged" pageWidth="200" pageHeight="200"
              leftMargin="10" rightMargin="10" topMargin="10" bottomMargin="10">
  <field name="n" class="java.lang.Integer"/>
  <detail>
    <band height="20">
      <textField>
        <reportElement x="0" y="0" width="180" height="20"/>
        <textFieldExpression><![CDATA["Row " + $F{n}]]></textFieldExpression>
      </textField>
    </band>
  </detail>
  <pageFooter>
    <band height="20">
      <textField>
        <reportElement x="0" y="0" width="180" height="20"/>
        <textFieldExpression><![CDATA["Page " + $V{PAGE_NUMBER} + " of " + $V{PAGE_COUNT}]]></textFieldExpression>
      </textField>
    </band>
  </pageFooter>
</jasperReport>
"#;

/// Every supported element kind and band section, for round-trip checks.
pub const KITCHEN_SINK: &str = r##"<jasperReport name="Everything" pageWidth="612" pageHeight="792">
  <parameter name="Since" class="java.util.Date"/>
  <parameter name="Rate" class="java.lang.Double">
    <defaultValueExpression><![CDATA[0.2]]></defaultValueExpression>
  </parameter>
  <field name="name" class="java.lang.String"><fieldDescription>Customer name</fieldDescription></field>
  <field name="joined" class="java.sql.Timestamp"/>
  <field name="active" class="java.lang.Boolean"/>
  <field name="balance" class="java.lang.Double"/>
  <sortField name="balance" order="Descending"/>
  <variable name="Customers" class="java.lang.Integer" calculation="Count"/>
  <variable name="Top" class="java.lang.Double" calculation="Highest">
    <variableExpression><![CDATA[$F{balance}]]></variableExpression>
  </variable>
  <variable name="PageBalance" class="java.lang.Double" calculation="Sum" resetType="Page">
    <variableExpression><![CDATA[$F{balance}]]></variableExpression>
  </variable>
  <variable name="FirstName" class="java.lang.String" calculation="First">
    <variableExpression><![CDATA[$F{name}]]></variableExpression>
  </variable>
  <title><band height="30">
    <staticText><reportElement x="0" y="0" width="300" height="30"/><text>Customers</text></staticText>
  </band></title>
  <pageHeader><band height="10">
    <line><reportElement x="0" y="5" width="572" height="0"/></line>
  </band></pageHeader>
  <columnHeader><band height="20">
    <rectangle><reportElement x="0" y="0" width="572" height="20" backcolor="#EEEEEE" mode="Opaque"/></rectangle>
  </band></columnHeader>
  <detail><band height="20">
    <textField isBlankWhenNull="true">
      <reportElement x="0" y="0" width="200" height="20"/>
      <textFieldExpression><![CDATA[upper($F{name})]]></textFieldExpression>
    </textField>
    <textField pattern="dd/MM/yyyy">
      <reportElement x="200" y="0" width="100" height="20"/>
      <textFieldExpression><![CDATA[$F{joined}]]></textFieldExpression>
    </textField>
    <textField>
      <reportElement x="300" y="0" width="100" height="20"/>
      <textFieldExpression><![CDATA[$F{active} ? "yes" : "no"]]></textFieldExpression>
    </textField>
    <textField pattern="#,##0.00">
      <reportElement x="400" y="0" width="100" height="20"/>
      <textFieldExpression><![CDATA[$F{balance} * (1 + $P{Rate})]]></textFieldExpression>
    </textField>
    <image>
      <reportElement x="500" y="0" width="20" height="20"/>
      <imageExpression><![CDATA["logo.png"]]></imageExpression>
    </image>
  </band></detail>
  <columnFooter><band height="10">
    <line><reportElement x="0" y="5" width="572" height="0"/></line>
  </band></columnFooter>
  <pageFooter><band height="20">
    <textField>
      <reportElement x="0" y="0" width="300" height="20"/>
      <textFieldExpression><![CDATA["Page total " + $V{PageBalance}]]></textFieldExpression>
    </textField>
  </band></pageFooter>
  <lastPageFooter><band height="20">
    <textField evaluationTime="Report">
      <reportElement x="0" y="0" width="300" height="20"/>
      <textFieldExpression><![CDATA[$V{Customers} + " customers, first " + coalesce($V{FirstName}, "?")]]></textFieldExpression>
    </textField>
  </band></lastPageFooter>
  <summary><band height="20">
    <textField>
      <reportElement x="0" y="0" width="300" height="20"/>
      <textFieldExpression><![CDATA["Top balance " + $V{Top}]]></textFieldExpression>
    </textField>
  </band></summary>
  <noData><band height="20">
    <staticText><reportElement x="0" y="0" width="300" height="20"/><text>No customers</text></staticText>
  </band></noData>
</jasperReport>
"##;

pub fn sales_rows() -> Value {
    json!([
        { "region": "North", "product": "Widget", "amount": 100 },
        { "region": "South", "product": "Gadget", "amount": 250.5 },
        { "region": "North", "product": "Gizmo", "amount": 50 },
        { "region": "South", "product": "Widget", "amount": 49.5 },
        { "region": "East", "product": "Gadget", "amount": 1000 }
    ])
}

/// `count` rows of the paged report, numbered from 1.
pub fn numbered_rows(count: usize) -> Value {
    Value::Array((1..=count).map(|n| json!({ "n": n })).collect())
}

pub fn customer_rows() -> Value {
    json!([
        { "name": "ada", "joined": "2021-03-04", "active": true, "balance": 10 },
        { "name": null, "joined": "2022-11-30T08:00:00", "active": false, "balance": 30 },
        { "name": "grace", "joined": null, "active": true, "balance": 20 }
    ])
}
